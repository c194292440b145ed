#[tokio::main]
async fn main() {
    if let Err(err) = parking_kiosk_lib::run().await {
        log::error!("Kiosk stopped: {err:#}");
        eprintln!("parking-kiosk: {err:#}");
        std::process::exit(1);
    }
}
