/// Level layers, as named in level files.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Layer {
    Platforms,  // Solid geometry
    Coins,      // Pickup: +1 score
    Foreground, // Decor drawn over the player
    Background, // Decor drawn behind the player
    DontTouch,  // Hazard: respawn on contact
    Keys,       // Pickup: +1 key
    Doors,      // Gate: consumes a key
}

impl Layer {
    pub const ALL: [Layer; 7] = [
        Layer::Platforms,
        Layer::Coins,
        Layer::Foreground,
        Layer::Background,
        Layer::DontTouch,
        Layer::Keys,
        Layer::Doors,
    ];

    /// Layer name as it appears in level files.
    pub fn name(self) -> &'static str {
        match self {
            Layer::Platforms => "Platforms",
            Layer::Coins => "Coins",
            Layer::Foreground => "Foreground",
            Layer::Background => "Background",
            Layer::DontTouch => "Don't Touch",
            Layer::Keys => "Keys",
            Layer::Doors => "Doors",
        }
    }

    pub fn from_name(name: &str) -> Option<Layer> {
        Layer::ALL.iter().copied().find(|l| l.name() == name)
    }
}
