/// Pixels of climbed height per point.
pub const HEIGHT_PER_POINT: f32 = 10.0;
/// Points per unit of currency collected.
pub const POINTS_PER_COIN: u64 = 5;
/// Points for stomping an enemy.
pub const STOMP_POINTS: u64 = 25;

/// Points for the highest height reached.
pub fn height_score(max_height: f32) -> u64 {
    if !max_height.is_finite() || max_height <= 0.0 {
        return 0;
    }
    (max_height / HEIGHT_PER_POINT) as u64
}

/// Total run score: height, currency, and stomps.
///
/// Coins count their currency value, so a gem is worth five coins.
pub fn run_score(max_height: f32, coins: u64, stomps: u64) -> u64 {
    height_score(max_height) + coins * POINTS_PER_COIN + stomps * STOMP_POINTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_points() {
        assert_eq!(height_score(0.0), 0);
        assert_eq!(height_score(-50.0), 0);
        assert_eq!(height_score(99.0), 9);
        assert_eq!(height_score(1500.0), 150);
        assert_eq!(height_score(f32::NAN), 0);
    }

    #[test]
    fn run_score_sums_components() {
        // 200 height pts + 3 coins + 1 stomp
        assert_eq!(run_score(2000.0, 3, 1), 200 + 15 + 25);
        assert_eq!(run_score(0.0, 0, 0), 0);
    }
}
