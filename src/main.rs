use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    nexora::cli::main()
}
