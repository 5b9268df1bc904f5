fn main() {
    if let Err(err) = rowforge::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
