use clap::Subcommand;
use nemuri_core::config::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a config value by dot-separated key
    Get { key: String },
    /// Set a config value by dot-separated key and save
    Set { key: String, value: String },
    /// Print the whole configuration as JSON
    Show,
    /// Print the config file path
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => {
                    println!("{value}");
                    Ok(())
                }
                None => Err(format!("unknown config key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            Ok(())
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
            Ok(())
        }
    }
}
