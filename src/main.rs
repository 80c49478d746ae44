#[tokio::main]
async fn main() {
    circleats::start_server().await;
}
