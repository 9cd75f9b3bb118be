fn main() {
    if let Err(e) = chatelet::cli::main() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
