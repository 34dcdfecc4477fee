fn main() {
    if let Err(err) = autoeda_lib::run() {
        eprintln!("autoeda: {}", err);
        std::process::exit(1);
    }
}
