/// Number of chambers in the roulette revolver.
pub const CHAMBERS: u8 = 6;

/// Minimum number of named participants for a direct roulette start.
pub const MIN_ROULETTE_PLAYERS: usize = 2;

/// Maximum length of an action button payload accepted by the transport.
pub const MAX_ACTION_DATA_LENGTH: usize = 64;

/// Default trigger word for duels.
pub const DEFAULT_DUEL_KEYWORD: &str = "дуэль";

/// Default trigger word for roulette.
pub const DEFAULT_ROULETTE_KEYWORD: &str = "рулетка";

/// Command that renders the leaderboard.
pub const STATS_COMMAND: &str = "stats";
