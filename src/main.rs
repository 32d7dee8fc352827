fn main() {
    #[cfg(feature = "cli")]
    snapdelta::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("snapdelta: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
