fn main() -> anyhow::Result<()> {
    let matches = templet::cli::command().get_matches();
    templet::cli::init_logging(matches.get_count("verbose"));
    templet::cli::run(&matches)
}
