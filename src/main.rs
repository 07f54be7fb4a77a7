#[tokio::main]
async fn main() {
    if let Err(error) = focusday_lib::run().await {
        eprintln!("focusday failed: {error}");
        std::process::exit(1);
    }
}
