fn main() {
    if let Err(error) = treetally_cli::run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
