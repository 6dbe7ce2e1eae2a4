use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    tracks: Option<PathBuf>,
    no_audio: bool,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;

    jukebox::app::run(jukebox::app::AppOptions {
        tracks_path: args.tracks,
        no_audio: args.no_audio,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--tracks" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--tracks requires a file path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--tracks cannot be empty");
                }
                out.tracks = Some(PathBuf::from(value.trim()));
            }
            "--no-audio" => out.no_audio = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("Jukebox");
    println!("  --tracks <path>   Track registry file (JSON)");
    println!("  --no-audio        Run without an audio output device");
}
