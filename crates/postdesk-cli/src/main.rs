#[tokio::main]
async fn main() {
    let code = postdesk_cli::run().await;
    if code != 0 {
        std::process::exit(code);
    }
}
