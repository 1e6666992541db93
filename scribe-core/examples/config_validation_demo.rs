//! Configuration loading, overrides and validation

use scribe_core::{Config, Result, WidgetKind};
use std::collections::HashMap;

fn main() -> Result<()> {
    println!("🔧 Configuration Demo\n");

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("scribe.json");

    // Round-trip the defaults through a file
    let mut config = Config::new();
    config.editor.auto_save_url = Some("https://blog.example/admin/post/3/autosave".to_string());
    config.save_to_file(&path)?;
    let loaded = Config::from_file(&path)?;
    println!("✅ Loaded {}", path.display());
    println!("   interval: {:?}", loaded.editor.auto_save_interval());
    println!("   indicator: {}", loaded.editor.widget.indicator_id());

    // Environment-style overrides
    let mut overridden = loaded.clone();
    let overrides = HashMap::from([
        ("SCRIBE_AUTOSAVE_INTERVAL_MS".to_string(), "5000".to_string()),
        ("SCRIBE_WIDGET".to_string(), "tinymde".to_string()),
    ]);
    overridden.apply_environment_overrides(&overrides)?;
    assert_eq!(overridden.editor.widget, WidgetKind::TinyMde);
    println!("✅ Overrides applied: {:?}", overridden.editor.auto_save_interval());

    // Validation failures
    let mut invalid = overridden.clone();
    invalid.editor.auto_save_url = Some("ftp://blog.example/autosave".to_string());
    match invalid.validate() {
        Ok(()) => println!("⚠️  Expected a validation error"),
        Err(e) => println!("❌ {} (severity {})", e, e.severity()),
    }

    Ok(())
}
