use clap::Subcommand;

use focusdeck_core::Config;

use crate::store;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current configuration as JSON
    Show,
    /// Set a config value
    Set {
        /// Config key (timer.focus_minutes, timer.break_minutes, backend.base_url)
        key: String,
        /// New value; an empty base_url clears it
        value: String,
    },
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let path = store::config_path();
    match action {
        ConfigAction::Show => {
            let config = Config::load_from(&path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(&path)?;
            match key.as_str() {
                "timer.focus_minutes" => config.timer.focus_minutes = value.parse()?,
                "timer.break_minutes" => config.timer.break_minutes = value.parse()?,
                "backend.base_url" => {
                    config.backend.base_url = if value.is_empty() { None } else { Some(value) };
                }
                _ => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
            config.save_to(&path)?;
            println!("ok");
        }
        ConfigAction::Reset => {
            Config::default().save_to(&path)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
