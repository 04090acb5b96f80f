// linkvault paths on Windows: %APPDATA%\linkvault

use std::env;
use std::path::PathBuf;

pub fn get_config_dir() -> PathBuf {
    let appdata = env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\ProgramData"));
    PathBuf::from(appdata).join("linkvault")
}
