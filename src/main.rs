use chrono::Local;
use failure::{err_msg, Error};
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::time::{Duration, Instant};
use vek::Vec2;

use shadowcull::config::{CullingConfig, DEFAULT_CONFIG_FILE};
use shadowcull::culling::{
    CullingFrame, CullingScheduler, OccluderEdge, OcclusionTarget, TargetKind, TickOutcome, Viewpoint,
};
use shadowcull::geometry::Bounds;

const TPS: u64 = 60;
const DEFAULT_TICKS: u64 = 600;
const SCENE_SEED: u64 = 0x5eed;

/// 固定頻率的 tick 時鐘
struct Clock {
    target: Duration,
    last: Instant,
    dt: Duration,
}

impl Clock {
    fn new(target: Duration) -> Self {
        Self { target, last: Instant::now(), dt: target }
    }

    fn dt(&self) -> Duration {
        self.dt
    }

    /// 睡到下一個 tick
    fn tick(&mut self) {
        let busy = self.last.elapsed();
        if busy < self.target {
            spin_sleep::sleep(self.target - busy);
        }
        let now = Instant::now();
        self.dt = now - self.last;
        self.last = now;
    }
}

/// 示範場景：房間格子、每間房四面牆（各開一道門）與散落的物件
struct Scene {
    walls: Vec<OccluderEdge>,
    rooms: Vec<OcclusionTarget>,
    entities: Vec<OcclusionTarget>,
}

impl Scene {
    fn generate(rng: &mut Pcg32, columns: u32, rows: u32, room_size: f32) -> Self {
        let mut walls = Vec::new();
        let mut rooms = Vec::new();
        let mut entities = Vec::new();
        let mut next_id = 1u64;
        let door = room_size * 0.2;

        for row in 0..rows {
            for col in 0..columns {
                let min = Vec2::new(col as f32 * room_size, row as f32 * room_size);
                let max = min + Vec2::broadcast(room_size);
                let room_id = next_id;
                next_id += 1;
                rooms.push(OcclusionTarget::room(room_id, Bounds::new(min, max)));

                let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)];
                for i in 0..4 {
                    let a = corners[i];
                    let b = corners[(i + 1) % 4];
                    if rng.random_bool(0.5) {
                        // 中間留一道門
                        let mid = (a + b) * 0.5;
                        let half = (b - a).normalized() * (door * 0.5);
                        walls.push(OccluderEdge::new(a, mid - half));
                        walls.push(OccluderEdge::new(mid + half, b));
                    } else {
                        walls.push(OccluderEdge::new(a, b));
                    }
                }

                for _ in 0..rng.random_range(2..8) {
                    let size = Vec2::new(rng.random_range(1.0..6.0), rng.random_range(1.0..6.0));
                    let center = Vec2::new(
                        rng.random_range(min.x + size.x..max.x - size.x),
                        rng.random_range(min.y + size.y..max.y - size.y),
                    );
                    let kind = if rng.random_bool(0.2) { TargetKind::Character } else { TargetKind::Item };
                    let mut target = OcclusionTarget::new(next_id, kind, Bounds::from_center_size(center, size))
                        .in_room(room_id);
                    if rng.random_bool(0.05) {
                        target = target.always_visible();
                    }
                    entities.push(target);
                    next_id += 1;
                }
            }
        }

        Self { walls, rooms, entities }
    }
}

fn setup_logger() -> Result<(), Error> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()
        .map_err(|e| err_msg(format!("logger setup failed: {}", e)))?;
    Ok(())
}

fn main() -> std::result::Result<(), Error> {
    setup_logger()?;

    let ticks = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<u64>().map_err(|_| err_msg(format!("invalid tick count: {}", arg)))?,
        None => DEFAULT_TICKS,
    };

    let config = CullingConfig::load_or_default(DEFAULT_CONFIG_FILE)?;
    info!("culling config: {:?}", config);
    let mut scheduler = CullingScheduler::new(config)?;

    let mut rng = Pcg32::seed_from_u64(SCENE_SEED);
    let room_size = 64.0;
    let scene = Scene::generate(&mut rng, 8, 8, room_size);
    info!(
        "scene: {} walls, {} rooms, {} entities",
        scene.walls.len(),
        scene.rooms.len(),
        scene.entities.len()
    );

    let world = 8.0 * room_size;
    let view_half = Vec2::new(240.0, 135.0);
    let mut clock = Clock::new(Duration::from_secs_f64(1.0 / TPS as f64));
    let mut time = 0.0f64;
    let mut outcomes = [0u64; 5];

    for tick in 0..ticks {
        // 視點沿著繞圈的路徑走過房間中心
        let angle = tick as f32 / ticks as f32 * std::f32::consts::TAU;
        let eye = Vec2::new(world * 0.5, world * 0.5) + Vec2::new(angle.cos(), angle.sin()) * (world * 0.3);
        // 中途暫時失去視點（例如角色死亡）
        let lost = tick > ticks / 2 && tick < ticks / 2 + TPS / 2;
        let viewpoint = if lost { None } else { Some(Viewpoint::new(eye)) };
        let view_rect = Bounds::new(eye - view_half, eye + view_half);

        let frame = CullingFrame::new(viewpoint, &scene.walls, &scene.entities)
            .with_rooms(&scene.rooms)
            .with_view_rect(view_rect);

        let outcome = scheduler.tick(time, &frame);
        let slot = match outcome {
            TickOutcome::Culled => 0,
            TickOutcome::Throttled => 1,
            TickOutcome::Reset => 2,
            TickOutcome::Idle => 3,
            TickOutcome::Disabled => 4,
        };
        outcomes[slot] += 1;
        if outcome == TickOutcome::Reset {
            warn!("tick {}: viewpoint lost, culling results cleared", tick);
        }

        clock.tick();
        time += clock.dt().as_secs_f64();
    }

    info!("final: {}", scheduler.stats());
    info!(
        "outcomes: culled {} throttled {} reset {} idle {} disabled {}",
        outcomes[0], outcomes[1], outcomes[2], outcomes[3], outcomes[4]
    );
    info!("pool: {:?}", scheduler.pool_stats());
    Ok(())
}
