use serde::Serialize;

/// Display tier for an Honor Score. Pure lookup over the total; plays no
/// part in the weighted computation itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HonorBadge {
    Elite,
    Expert,
    Professional,
    RisingStar,
    New,
}

impl HonorBadge {
    pub fn for_score(score: f64) -> Self {
        if score >= 90.0 {
            HonorBadge::Elite
        } else if score >= 75.0 {
            HonorBadge::Expert
        } else if score >= 60.0 {
            HonorBadge::Professional
        } else if score >= 40.0 {
            HonorBadge::RisingStar
        } else {
            HonorBadge::New
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HonorBadge::Elite => "Elite",
            HonorBadge::Expert => "Expert",
            HonorBadge::Professional => "Professional",
            HonorBadge::RisingStar => "Rising Star",
            HonorBadge::New => "New",
        }
    }

    /// Badge color as shown in the app.
    pub fn color_hex(self) -> &'static str {
        match self {
            HonorBadge::Elite => "#FFD700",
            HonorBadge::Expert => "#C0C0C0",
            HonorBadge::Professional => "#CD7F32",
            HonorBadge::RisingStar => "#4CAF50",
            HonorBadge::New => "#9E9E9E",
        }
    }

    pub fn color_rgb(self) -> (u8, u8, u8) {
        match self {
            HonorBadge::Elite => (255, 215, 0),
            HonorBadge::Expert => (192, 192, 192),
            HonorBadge::Professional => (205, 127, 50),
            HonorBadge::RisingStar => (76, 175, 80),
            HonorBadge::New => (158, 158, 158),
        }
    }
}
