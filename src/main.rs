fn main() {
    match skyux::run() {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            skyux::ui::error(&err.to_string());
            std::process::exit(1);
        }
    }
}
