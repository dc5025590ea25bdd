use std::env;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub templates: Option<PathBuf>,
    pub device: Option<String>,
    pub debug: bool,
}

impl Args {
    /// Parse command line flags. Returns None when the program should exit
    /// immediately (help/version printed, or a bad flag).
    pub fn parse() -> Option<Self> {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Args::default();

        for arg in args.iter().skip(1) {
            if arg == "--help" || arg == "-h" {
                print_help();
                return None;
            } else if arg == "--version" || arg == "-v" {
                println!("adb-battle-bot v{}", env!("APP_VERSION_DISPLAY"));
                return None;
            } else if arg == "--debug" {
                parsed.debug = true;
            } else if let Some(path) = arg.strip_prefix("--config=") {
                parsed.config = Some(PathBuf::from(path));
            } else if let Some(path) = arg.strip_prefix("--templates=") {
                parsed.templates = Some(PathBuf::from(path));
            } else if let Some(serial) = arg.strip_prefix("--device=") {
                parsed.device = Some(serial.to_string());
            } else {
                eprintln!("Unknown argument: {arg}");
                print_help();
                return None;
            }
        }

        Some(parsed)
    }
}

fn print_help() {
    println!("adb-battle-bot (build {})", env!("APP_BUILD_YEAR"));
    println!();
    println!("USAGE:");
    println!("    adb-battle-bot [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    --config=<file>     Load engine configuration from a JSON file");
    println!("    --templates=<dir>   Directory with marker templates (default: templates)");
    println!("    --device=<serial>   Use a specific device instead of the first one");
    println!("    --debug             Verbose logging");
    println!("    --help, -h          Show this help message");
    println!("    --version, -v       Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    adb-battle-bot --templates=assets/markers");
    println!("    adb-battle-bot --config=bot.json --debug");
}
