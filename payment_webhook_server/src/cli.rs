use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "PWS_HOST",
        "PWS_PORT",
        "PWS_DATABASE_URL",
        "PWS_GATEWAY_API_URL",
        "PWS_GATEWAY_TIMEOUT_SECS",
        "PWS_GATEWAY_SIMULATION",
        "PWS_RETRY_MAX_ATTEMPTS",
        "PWS_RETRY_BASE_DELAY_MS",
        "PWS_EVENT_BUFFER_SIZE",
    ];
    const SECRET_ENVS: [&str; 2] = ["PWS_GATEWAY_ACCESS_TOKEN", "PWS_WEBHOOK_SECRET"];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    });
    SECRET_ENVS.iter().for_each(|&name| {
        let val = if env::var(name).map(|s| !s.trim().is_empty()).unwrap_or(false) { "Set" } else { "Not set" };
        println!("  {name:<35} {val:<15}");
    })
}
