use std::fmt::Write;

use crate::simulation::{Game, GameOverReason, TickStatistics};
use crate::world::TileType;

const SELECTED_GLYPH: char = '*';
const VILLAGER_GLYPH: char = '@';

/// Render the board with a status line above it.
///
/// Living villagers are drawn over the tile they stand on; the selected tile
/// is drawn over everything else.
pub fn render_game(game: &Game) -> String {
    let grid = game.grid();
    let mut cells: Vec<char> = grid.tiles().iter().map(|t| t.tile_type.glyph()).collect();

    for villager in game.villagers().iter().filter(|v| v.is_alive()) {
        if let Some(pos) = grid.hit_test(villager.position) {
            cells[(pos.y() * grid.width() + pos.x()) as usize] = VILLAGER_GLYPH;
        }
    }
    if let Some(pos) = game.selected() {
        cells[(pos.y() * grid.width() + pos.x()) as usize] = SELECTED_GLYPH;
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", status_line(game));

    let _ = write!(out, "   ");
    for x in 0..grid.width() {
        let _ = write!(out, "{}", x % 10);
    }
    out.push('\n');
    for (y, row) in cells.chunks(grid.width() as usize).enumerate() {
        let _ = write!(out, "{:>2} ", y);
        out.extend(row.iter());
        out.push('\n');
    }

    if let Some(banner) = game_over_banner(game) {
        let _ = writeln!(out, "{}", banner);
    }
    out
}

fn status_line(game: &Game) -> String {
    let mut line = format!(
        "Wave {} | villages {} | villagers {}/{}",
        game.wave(),
        game.village_tiles().len(),
        game.alive_villagers(),
        game.villagers().len()
    );
    if let Some(remaining) = game.time_until_tick() {
        let _ = write!(line, " | next tick in {:.1}s", remaining.as_secs_f32());
    }
    line
}

/// Banner for a finished game, `None` while it is still running.
pub fn game_over_banner(game: &Game) -> Option<String> {
    let reason = match game.game_over_reason()? {
        GameOverReason::VillagesLost => "every village burned",
        GameOverReason::VillagersLost => "every villager died",
    };
    Some(format!(
        "*** GAME OVER in wave {}: {} ***",
        game.wave(),
        reason
    ))
}

/// One-line summary of a tick, used between waves in headless runs.
pub fn format_statistics(stats: &TickStatistics) -> String {
    format!(
        "wave {:>3} tick {:>4} | fire {:>3} burnt {:>3} grass {:>3} water {:>3} | villages {:>2} | villagers {}/{} | {:.0}% burnt",
        stats.wave,
        stats.tick,
        stats.count(TileType::Fire),
        stats.count(TileType::BurntVillage),
        stats.count(TileType::Grass),
        stats.count(TileType::Water),
        stats.villages_remaining,
        stats.villagers_alive,
        stats.villagers_total,
        stats.burnt_fraction() * 100.0
    )
}
