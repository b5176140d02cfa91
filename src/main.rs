fn main() {
    #[cfg(feature = "cli")]
    detools::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("detools: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
