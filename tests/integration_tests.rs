use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use mapix::prelude::*;
use mapix::rendering::context::DrawCommand;

/// Integration tests driving a whole map session the way a host widget would
#[cfg(test)]
mod integration_tests {
    use super::*;

    const CENTER: (f64, f64) = (-3.7319, -38.5267);

    fn session_with_overlays() -> MapSession {
        #[cfg(feature = "debug")]
        mapix::init_logging();
        let viewport = Viewport::new(LatLng::new(CENTER.0, CENTER.1), 17.0, Point::new(800.0, 600.0));
        let mut session = MapSession::new(viewport, LiveCellStore::new(5000));
        session
            .add_layer(Box::new(PixelCanvasLayer::new("pixels")))
            .unwrap();
        session
            .add_layer(Box::new(ReticleLayer::new("reticle")))
            .unwrap();
        session
    }

    fn fill_rects(session: &MapSession) -> Vec<Bounds> {
        session
            .surfaces()
            .into_iter()
            .filter(|(pane, _)| pane.id == "pixel-canvas-pane")
            .flat_map(|(_, ctx)| ctx.commands().to_vec())
            .filter_map(|command| match command {
                DrawCommand::FillRect { bounds, .. } => Some(bounds),
                _ => None,
            })
            .collect()
    }

    fn reticle_commands(session: &MapSession) -> Vec<DrawCommand> {
        session
            .surfaces()
            .into_iter()
            .filter(|(pane, _)| pane.id == "mapix-grid-overlay")
            .flat_map(|(_, ctx)| ctx.commands().to_vec())
            .collect()
    }

    fn nearby_cells(count: usize) -> Vec<Cell> {
        (0..count)
            .map(|i| {
                let offset = (i as f64) * GRID_STEP_DEG;
                Cell::new(CENTER.0 + offset, CENTER.1 - offset, (i % 256) as u8)
            })
            .collect()
    }

    #[test]
    fn seeded_cells_are_painted_after_store_pump() {
        let mut session = session_with_overlays();
        session.store().seed(nearby_cells(10));
        session.pump_store_changes().unwrap();

        assert_eq!(fill_rects(&session).len(), 10);
        let pixels = session.layer::<PixelCanvasLayer>("pixels").unwrap();
        assert_eq!(pixels.last_repaint().painted, 10);
    }

    #[test]
    fn pan_reprojects_every_cell() {
        let mut session = session_with_overlays();
        session.store().seed(nearby_cells(3));
        session.pump_store_changes().unwrap();
        let before = fill_rects(&session);

        session.pan_by(Point::new(40.0, -25.0)).unwrap();
        let after = fill_rects(&session);

        assert_eq!(before.len(), after.len());
        for (old, new) in before.iter().zip(after.iter()) {
            assert!((old.min.x - new.min.x - 40.0).abs() < 1e-6);
            assert!((old.min.y - new.min.y + 25.0).abs() < 1e-6);
        }
    }

    #[test]
    fn zoom_doubles_cell_size() {
        let mut session = session_with_overlays();
        session.store().seed(nearby_cells(1));
        session.pump_store_changes().unwrap();
        let width_before = fill_rects(&session)[0].width();

        session.zoom_to(18.0, None).unwrap();
        let width_after = fill_rects(&session)[0].width();

        assert!((width_after / width_before - 2.0).abs() < 1e-6);
    }

    #[test]
    fn resize_then_repaint_leaves_no_ghosts() {
        let mut session = session_with_overlays();
        session.store().seed(nearby_cells(5));
        session.pump_store_changes().unwrap();

        session.resize(Point::new(400.0, 300.0)).unwrap();

        let (_, surface) = session
            .surfaces()
            .into_iter()
            .find(|(pane, _)| pane.id == "pixel-canvas-pane")
            .unwrap();
        assert_eq!((surface.width(), surface.height()), (400, 300));

        // Exactly the visible cells, all projected against the new size
        let rects = fill_rects(&session);
        assert_eq!(rects.len(), 5);
        let projector = ViewportProjector::new(session.host()).unwrap();
        for (rect, cell) in rects.iter().zip(session.store().snapshot().iter_paint_order()) {
            assert_eq!(*rect, projector.cell_screen_rect(cell.lat, cell.lng));
        }
    }

    #[test]
    fn reticle_follows_pointer_and_disables_immediately() {
        let mut session = session_with_overlays();
        session.pointer_move(Point::new(400.0, 300.0)).unwrap();
        session.frame().unwrap();
        assert_eq!(reticle_commands(&session).len(), 1);

        session
            .with_layer_mut::<ReticleLayer, _, _>("reticle", |reticle, _| reticle.set_enabled(false))
            .unwrap();
        session.frame().unwrap();

        assert!(reticle_commands(&session).is_empty());
        let reticle = session.layer::<ReticleLayer>("reticle").unwrap();
        assert!(reticle.last_highlighted().is_some());

        session
            .with_layer_mut::<ReticleLayer, _, _>("reticle", |reticle, _| reticle.set_enabled(true))
            .unwrap();
        session.frame().unwrap();
        assert_eq!(reticle_commands(&session).len(), 1);
    }

    #[test]
    fn reticle_brackets_are_centered_on_the_quantized_slot() {
        let mut session = session_with_overlays();
        let pointer = Point::new(413.0, 291.0);
        session.pointer_move(pointer).unwrap();
        session.frame().unwrap();

        let slot = session.layer::<ReticleLayer>("reticle").unwrap().last_highlighted().unwrap();
        let center = session.host().lat_lng_to_pixel(&slot.center());
        match &reticle_commands(&session)[0] {
            DrawCommand::StrokeSegments { segments, style } => {
                assert_eq!(segments.len(), 8);
                assert_eq!(segments[0].0, Point::new(center.x - 10.0, center.y - 10.0));
                assert_eq!(style.width, 2.0);
                assert_eq!(style.alpha, 0.9);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn reticle_waits_for_ready_host() {
        let viewport = Viewport::pending(LatLng::new(0.0, 0.0), 17.0, Point::new(800.0, 600.0));
        let mut session = MapSession::new(viewport, LiveCellStore::default());
        session.add_layer(Box::new(ReticleLayer::new("reticle"))).unwrap();
        assert_eq!(session.frames().active_count(), 0);

        session.set_ready().unwrap();
        assert_eq!(session.frames().active_count(), 1);
    }

    #[test]
    fn repeated_attach_detach_does_not_leak() {
        let mut session = session_with_overlays();
        for _ in 0..50 {
            let reticle = session.remove_layer("reticle").unwrap().unwrap();
            let pixels = session.remove_layer("pixels").unwrap().unwrap();
            assert_eq!(reticle.state(), LayerState::Detached);
            assert_eq!(pixels.state(), LayerState::Detached);

            session.add_layer(Box::new(PixelCanvasLayer::new("pixels"))).unwrap();
            session.add_layer(Box::new(ReticleLayer::new("reticle"))).unwrap();
        }

        assert_eq!(session.frames().active_count(), 1);
        assert_eq!(session.panes().surface_count(), 2);
        assert_eq!(session.events().subscribers(MapEventKind::PointerMove), vec!["reticle".to_string()]);
    }

    #[test]
    fn frames_after_detach_are_noops() {
        let mut session = session_with_overlays();
        session.remove_layer("reticle").unwrap();
        session.frame().unwrap();
        session.dispatch(MapEvent::CellsChanged).unwrap();
        assert!(reticle_commands(&session).is_empty());
    }

    #[test]
    fn accepted_placement_repaints_through_store() {
        let mut session = session_with_overlays();
        let client = PlacementClient::new("http://127.0.0.1:9/place", "anon", session.store().clone());

        let body = format!(
            r#"{{"ok": true, "lat": {}, "lng": {}, "color": 42, "pool_size": 9}}"#,
            quantize(CENTER.0),
            quantize(CENTER.1)
        );
        let receipt = client.apply_response(&body).unwrap();
        assert_eq!(receipt.pool_size, 9);

        session.pump_store_changes().unwrap();
        assert_eq!(fill_rects(&session).len(), 1);
        assert_eq!(session.store().snapshot().first().map(|c| c.color), Some(42));
    }

    #[test]
    fn retention_bound_applies_to_merges() {
        let store = LiveCellStore::new(5000);
        store.seed(nearby_cells(5000));
        store.merge(Cell::new(1.0, 1.0, 200));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 5000);
        assert_eq!(snapshot.first(), Some(&Cell::new(1.0, 1.0, 200)));
    }

    struct ScriptedFeed(Vec<FeedSignal>);

    #[async_trait]
    impl PushFeed for ScriptedFeed {
        async fn subscribe(&self, _channel: &str) -> Result<BoxStream<'static, FeedSignal>> {
            Ok(futures::stream::iter(self.0.clone())
                .chain(futures::stream::pending())
                .boxed())
        }
    }

    struct FixedSeed(Vec<Cell>);

    #[async_trait]
    impl SeedSource for FixedSeed {
        async fn load_recent(&self, limit: usize) -> Result<Vec<Cell>> {
            Ok(self.0.iter().take(limit).copied().collect())
        }
    }

    #[tokio::test]
    async fn live_feed_and_reconnect_reach_the_canvas() {
        let mut session = session_with_overlays();
        let seed = Arc::new(FixedSeed(nearby_cells(4)));
        assert_eq!(session.seed_from(seed.as_ref(), 100).await.unwrap(), 4);

        let payload = format!(
            r#"{{"new": {{"lat": {}, "lng": {}, "color": 9}}}}"#,
            CENTER.0 - 0.0004,
            CENTER.1 + 0.0004
        );
        let feed = Arc::new(ScriptedFeed(vec![
            FeedSignal::Payload(payload),
            FeedSignal::Payload("garbage".to_string()),
            FeedSignal::Reconnected,
        ]));
        let pump = FeedPump::new(session.store().clone()).with_reseed(seed, 100);
        session.connect_feed(feed, PLACEMENTS_CHANNEL, pump).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(session.feed().map(|f| f.is_active()).unwrap_or(false));

        // Merge then re-seed: the gap-free seed replaces the merged entry
        assert_eq!(session.pump_store_changes().unwrap(), 1);
        assert_eq!(session.store().len(), 4);
        assert_eq!(fill_rects(&session).len(), 4);

        session.teardown().unwrap();
        assert!(session.feed().is_none());
    }
}
