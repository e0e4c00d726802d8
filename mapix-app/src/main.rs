use anyhow::{bail, Context};
use mapix::prelude::*;

/// Headless pixel map driver.
///
/// Seeds the store from `MAPIX_SEED_URL`, renders one frame around the
/// newest cell and, given `<lat> <lng> <color>` plus `MAPIX_AUTH_TOKEN`,
/// places a cell.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = MapixConfig::from_env().context("invalid MAPIX_* configuration")?;
    let store = LiveCellStore::new(config.retention_bound);

    if let Some(seed_url) = &config.seed_url {
        let mut source = RestSeedSource::new(seed_url.clone());
        if let Some(key) = &config.api_key {
            source = source.with_api_key(key.clone());
        }
        let cells = source
            .load_recent(config.seed_limit)
            .await
            .context("bulk seed failed")?;
        println!("seeded {} cells", cells.len());
        store.seed(cells);
    } else {
        log::warn!("MAPIX_SEED_URL not set, starting with an empty canvas");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        place_from_args(&config, &store, &args).await?;
    }

    let center = store
        .snapshot()
        .first()
        .map(|cell| cell.lat_lng())
        .unwrap_or_default();
    let mut session = MapSession::new(Viewport::new(center, 17.0, Point::new(1024.0, 768.0)), store);
    session.add_layer(Box::new(PixelCanvasLayer::from_config("pixels", &config)))?;
    session.add_layer(Box::new(ReticleLayer::from_config("reticle", &config)))?;
    session.pointer_move(Point::new(512.0, 384.0))?;
    session.frame()?;

    if let Some(pixels) = session.layer::<PixelCanvasLayer>("pixels") {
        let stats = pixels.last_repaint();
        println!(
            "rendered {} cells around ({:.4}, {:.4}); {} culled, {} offscreen",
            stats.painted, center.lat, center.lng, stats.culled, stats.offscreen
        );
    }
    for (pane, surface) in session.surfaces() {
        println!(
            "  pane {:<20} z={:<4} {}x{} {} commands",
            pane.id,
            pane.z_index,
            surface.width(),
            surface.height(),
            surface.commands().len()
        );
    }

    session.teardown()?;
    Ok(())
}

async fn place_from_args(config: &MapixConfig, store: &LiveCellStore, args: &[String]) -> anyhow::Result<()> {
    let [lat, lng, color] = args else {
        bail!("usage: mapix-app [<lat> <lng> <color>]");
    };
    let lat: f64 = lat.parse().context("lat")?;
    let lng: f64 = lng.parse().context("lng")?;
    let color: u8 = color.parse().context("color must be 0-255")?;
    let token = std::env::var("MAPIX_AUTH_TOKEN").context("MAPIX_AUTH_TOKEN is required to place")?;

    let client = PlacementClient::from_config(config, store.clone())?;
    let request = PlacementRequest::at(&LatLng::new(lat, lng), color);

    match client.place(&request, &AuthToken::new(token)).await {
        Ok(receipt) => println!(
            "placed color {} at ({}, {}); {} placements left",
            receipt.cell.color, receipt.cell.lat, receipt.cell.lng, receipt.pool_size
        ),
        Err(e) if e.is_rate_limited() => println!(
            "rate limited; next placement in {:.0}s",
            e.refill_in().unwrap_or_default()
        ),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
