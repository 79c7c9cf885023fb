//! Daily health tips.
//!
//! Stateless: every call draws uniformly from the fixed list, repeats allowed.

use rand::seq::SliceRandom;

/// The fixed tip list shown on the assistant page
pub const HEALTH_TIPS: [&str; 8] = [
    "Drink at least 8 glasses of water daily.",
    "Get 7-8 hours of sleep each night.",
    "Exercise for at least 30 minutes daily.",
    "Eat a balanced diet with fruits and vegetables.",
    "Avoid smoking and limit alcohol consumption.",
    "Take breaks from screens to rest your eyes.",
    "Practice mindfulness or meditation to reduce stress.",
    "Wash your hands regularly to prevent infections.",
];

/// Pick one tip uniformly at random
pub fn random_tip() -> &'static str {
    let mut rng = rand::thread_rng();
    // The list is non-empty, so choose() cannot return None
    HEALTH_TIPS.choose(&mut rng).copied().unwrap_or(HEALTH_TIPS[0])
}
