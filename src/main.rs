fn main() {
    if let Err(err) = dialogue_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
