use crate::{
    constants::{HIGH_SCORE_MIN_CIBIL, MAX_AWARD_ATTEMPTS, PREDICTION_MASTER_THRESHOLD},
    error::{AppError, Result},
    models::{PredictionRecord, User},
};
use serde::Serialize;

pub const FIRST_PREDICTION: &str = "first_prediction";
pub const VERIFIED_USER: &str = "verified_user";
pub const PREDICTION_MASTER: &str = "prediction_master";
pub const APPROVED_ONCE: &str = "approved_once";
pub const HIGH_SCORE: &str = "high_score";
pub const CALCULATOR_USER: &str = "calculator_user";
pub const EXPORT_EXPERT: &str = "export_expert";
pub const WEEK_STREAK: &str = "week_streak";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub key: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub points: i64,
}

pub static BADGES: [Badge; 8] = [
    Badge {
        key: FIRST_PREDICTION,
        name: "First Steps",
        icon: "🎯",
        description: "Made your first prediction",
        points: 10,
    },
    Badge {
        key: VERIFIED_USER,
        name: "Verified User",
        icon: "✅",
        description: "Verified your account",
        points: 20,
    },
    Badge {
        key: PREDICTION_MASTER,
        name: "Prediction Master",
        icon: "🏆",
        description: "Made 10 predictions",
        points: 50,
    },
    Badge {
        key: APPROVED_ONCE,
        name: "First Approval",
        icon: "💰",
        description: "Got your first loan approved",
        points: 30,
    },
    Badge {
        key: HIGH_SCORE,
        name: "Credit Champion",
        icon: "⭐",
        description: "CIBIL score above 750",
        points: 40,
    },
    Badge {
        key: CALCULATOR_USER,
        name: "Calculator Pro",
        icon: "🧮",
        description: "Used the calculator",
        points: 15,
    },
    Badge {
        key: EXPORT_EXPERT,
        name: "Data Export Expert",
        icon: "📊",
        description: "Exported your data",
        points: 25,
    },
    Badge {
        key: WEEK_STREAK,
        name: "Weekly Warrior",
        icon: "🔥",
        description: "Used the app 7 days in a row",
        points: 100,
    },
];

/// Badges earned by app activity the backend does not observe itself.
pub const EVENT_BADGES: [&str; 3] = [CALCULATOR_USER, EXPORT_EXPERT, WEEK_STREAK];

pub fn find_badge(key: &str) -> Option<&'static Badge> {
    BADGES.iter().find(|badge| badge.key == key)
}

pub fn is_event_badge(key: &str) -> bool {
    EVENT_BADGES.contains(&key)
}

/// Earned badge keys in award order, each at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeSet(Vec<String>);

impl BadgeSet {
    /// Parses the stored JSON list. Anything unreadable yields an empty set.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(keys) => {
                let mut set = Self::default();
                for key in keys {
                    set.insert(&key);
                }
                set
            }
            Err(err) => {
                if !raw.trim().is_empty() {
                    tracing::warn!("Malformed stored badge list, treating as empty: {}", err);
                }
                Self::default()
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|held| held == key)
    }

    /// Returns false if the key was already present.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.contains(key) {
            return false;
        }
        self.0.push(key.to_string());
        true
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_stored(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

/// Persistence for badge awards.
#[async_trait::async_trait]
pub trait BadgeStore: Send + Sync {
    /// Atomically replaces the stored badge text and adds `points_delta`,
    /// but only while the stored text still equals `expected`.
    async fn commit_badges(
        &self,
        user_id: i64,
        expected: &str,
        badges: &str,
        points_delta: i64,
    ) -> Result<bool>;

    /// Current stored badge text and points, `None` if the user is gone.
    async fn load_badges(&self, user_id: i64) -> Result<Option<(String, i64)>>;
}

/// Catalogue entries for the badges a user holds, in earned order.
pub fn user_badges(user: &User) -> Vec<&'static Badge> {
    BadgeSet::parse(&user.badges)
        .keys()
        .filter_map(find_badge)
        .collect()
}

pub struct BadgeEngine<S> {
    store: S,
}

impl<S: BadgeStore> BadgeEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Awards `badge_key` once. `None` when the key is unknown or already
    /// held. A commit that loses to a concurrent write reloads the row and
    /// tries again.
    pub async fn award_badge(
        &self,
        user: &mut User,
        badge_key: &str,
    ) -> Result<Option<&'static Badge>> {
        let Some(badge) = find_badge(badge_key) else {
            return Ok(None);
        };

        for attempt in 1..=MAX_AWARD_ATTEMPTS {
            let mut badges = BadgeSet::parse(&user.badges);
            if !badges.insert(badge.key) {
                return Ok(None);
            }
            let stored = badges.to_stored()?;

            let committed = self
                .store
                .commit_badges(user.id, &user.badges, &stored, badge.points)
                .await?;
            if committed {
                user.badges = stored;
                user.points += badge.points;
                tracing::info!(
                    "Awarded badge {} (+{} points) to user {}",
                    badge.key,
                    badge.points,
                    user.id
                );
                return Ok(Some(badge));
            }

            let (current, points) = self
                .store
                .load_badges(user.id)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
            tracing::debug!(
                "Badge {} for user {} hit a concurrent write (attempt {}), reloaded",
                badge.key,
                user.id,
                attempt
            );
            user.badges = current;
            user.points = points;
        }

        Err(AppError::Internal(format!(
            "badge {} for user {} kept conflicting after {} attempts",
            badge.key, user.id, MAX_AWARD_ATTEMPTS
        )))
    }

    /// Evaluates first-prediction, prediction-master and verified-user,
    /// in that order, returning whatever was newly awarded. First-prediction
    /// is checked whenever any prediction exists so a user who reaches the
    /// master threshold without it still receives both.
    pub async fn check_and_award(
        &self,
        user: &mut User,
        predictions: &[PredictionRecord],
    ) -> Result<Vec<&'static Badge>> {
        let mut awarded = Vec::new();

        if !predictions.is_empty() {
            if let Some(badge) = self.award_badge(user, FIRST_PREDICTION).await? {
                awarded.push(badge);
            }
        }

        if predictions.len() >= PREDICTION_MASTER_THRESHOLD {
            if let Some(badge) = self.award_badge(user, PREDICTION_MASTER).await? {
                awarded.push(badge);
            }
        }

        if user.is_verified {
            if let Some(badge) = self.award_badge(user, VERIFIED_USER).await? {
                awarded.push(badge);
            }
        }

        Ok(awarded)
    }

    /// Badges earned by the outcome of a single stored prediction:
    /// high-score for CIBIL above 750, first-approval for an approved loan.
    pub async fn award_for_prediction(
        &self,
        user: &mut User,
        prediction: &PredictionRecord,
    ) -> Result<Vec<&'static Badge>> {
        let mut awarded = Vec::new();

        if prediction.cibil_score > HIGH_SCORE_MIN_CIBIL {
            if let Some(badge) = self.award_badge(user, HIGH_SCORE).await? {
                awarded.push(badge);
            }
        }

        if prediction.loan_status == "Approved" {
            if let Some(badge) = self.award_badge(user, APPROVED_ONCE).await? {
                awarded.push(badge);
            }
        }

        Ok(awarded)
    }
}
