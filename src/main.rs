fn main() {
    if let Err(error) = testcraft_lib::run() {
        eprintln!("error: {error}");
        if let Some(raw) = error.raw_response() {
            eprintln!("--- model response ---\n{raw}");
        }
        std::process::exit(1);
    }
}
