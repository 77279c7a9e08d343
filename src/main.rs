fn main() {
    if let Err(err) = field_replace::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
