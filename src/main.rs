fn main() {
    if let Err(err) = bpmn_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
