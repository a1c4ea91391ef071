/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and viewport updates.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    Hazard,
    Fell,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Jumped,
    CoinCollected,
    KeyCollected,
    DoorUnlocked,
    PlayerDied { cause: DeathCause },
    /// `level` is the index that was just entered.
    LevelCompleted { level: u32 },
    GameCompleted,
    ViewportChanged { left: i32, bottom: i32 },
}
