/// Commands a player may send, one per line. Matching is case-insensitive
/// and surrounding whitespace is stripped; anything unrecognized is ignored
/// by the connection handler rather than treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Reshuffle the shared deck and broadcast the new order to everyone.
    Shuffle,
    /// Gracefully end this connection.
    Disconnect,
}

const KEY_SHUFFLE: &str = "SHUFFLE";
const KEY_DISCONNECT: &str = "DISCONNECT";

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case(KEY_SHUFFLE) {
            Some(Command::Shuffle)
        } else if trimmed.eq_ignore_ascii_case(KEY_DISCONNECT) {
            Some(Command::Disconnect)
        } else {
            None
        }
    }
}
