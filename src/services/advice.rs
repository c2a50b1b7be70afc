use crate::{
    constants::{ADVICE_MAX_LOAN_TO_INCOME, ADVICE_MIN_ASSET_COVERAGE, ADVICE_MIN_CIBIL_SCORE},
    models::PredictionData,
};

pub const ADVICE_IMPROVE_SCORE: &str =
    "🎯 Priority: Improve your CIBIL score to 750+ for better approval chances.";
pub const ADVICE_HIGH_LOAN_TO_INCOME: &str =
    "💡 Your loan amount is high relative to income. Consider reducing it or increasing income sources.";
pub const ADVICE_BUILD_ASSETS: &str =
    "🏠 Building assets will strengthen your application. Consider increasing asset documentation.";
pub const ADVICE_STRONG_PROFILE: &str =
    "✅ Your profile looks strong! Keep maintaining good financial habits.";

/// Recommendations for a computed prediction, in fixed rule order.
/// Never empty. `income_annum` must be positive.
pub fn advise(prediction: &PredictionData) -> Vec<String> {
    let mut advice = Vec::new();

    if prediction.cibil_score < ADVICE_MIN_CIBIL_SCORE {
        advice.push(ADVICE_IMPROVE_SCORE.to_string());
    }

    if prediction.loan_to_income() > ADVICE_MAX_LOAN_TO_INCOME {
        advice.push(ADVICE_HIGH_LOAN_TO_INCOME.to_string());
    }

    if prediction.total_assets() < prediction.loan_amount * ADVICE_MIN_ASSET_COVERAGE {
        advice.push(ADVICE_BUILD_ASSETS.to_string());
    }

    if advice.is_empty() {
        advice.push(ADVICE_STRONG_PROFILE.to_string());
    }

    advice
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(cibil: i32, loan: f64, income: f64, residential: f64) -> PredictionData {
        PredictionData {
            cibil_score: cibil,
            loan_amount: loan,
            income_annum: income,
            residential_assets_value: Some(residential),
            commercial_assets_value: Some(0.0),
            luxury_assets_value: None,
        }
    }

    #[test]
    fn low_score_without_assets_skips_ratio_below_four() {
        // 1,000,000 / 300,000 is about 3.33, under the ratio limit
        let advice = advise(&data(650, 1_000_000.0, 300_000.0, 0.0));
        assert_eq!(
            advice,
            vec![
                ADVICE_IMPROVE_SCORE.to_string(),
                ADVICE_BUILD_ASSETS.to_string(),
            ]
        );
    }

    #[test]
    fn weak_profile_gets_all_three_in_order() {
        let advice = advise(&data(650, 1_000_000.0, 200_000.0, 0.0));
        assert_eq!(
            advice,
            vec![
                ADVICE_IMPROVE_SCORE.to_string(),
                ADVICE_HIGH_LOAN_TO_INCOME.to_string(),
                ADVICE_BUILD_ASSETS.to_string(),
            ]
        );
    }

    #[test]
    fn strong_profile_gets_only_reinforcement() {
        let advice = advise(&data(800, 100_000.0, 1_000_000.0, 1_000_000.0));
        assert_eq!(advice, vec![ADVICE_STRONG_PROFILE.to_string()]);
    }

    #[test]
    fn thresholds_are_strict() {
        // score of exactly 700 and a ratio of exactly 4
        let advice = advise(&data(700, 400_000.0, 100_000.0, 200_000.0));
        assert_eq!(advice, vec![ADVICE_STRONG_PROFILE.to_string()]);
    }

    #[test]
    fn assets_sum_across_categories() {
        let mut prediction = data(750, 1_000_000.0, 1_000_000.0, 100_000.0);
        prediction.commercial_assets_value = Some(100_000.0);
        prediction.luxury_assets_value = Some(99_999.0);
        assert_eq!(advise(&prediction), vec![ADVICE_BUILD_ASSETS.to_string()]);

        prediction.luxury_assets_value = Some(100_001.0);
        assert_eq!(advise(&prediction), vec![ADVICE_STRONG_PROFILE.to_string()]);
    }
}
