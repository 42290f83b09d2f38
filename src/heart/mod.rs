//! Reference heart-disease risk model
//!
//! Five patient measurements (age, resting blood pressure, serum cholesterol,
//! maximum heart rate, ST depression) are each split into three triangular
//! terms derived from the dataset's min, mean and max. Six rules map them onto
//! a 0 to 100 risk score, which is finally bucketed into a [`RiskCategory`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ErrorCode, FuzzyResult};
use crate::fuzzy::{
    Evaluation, InferenceEngine, InferenceSettings, LinguisticVariable, MembershipFunction,
    OutputValue, Universe, parse_rule,
};

/// Name of the output variable
pub const RISK: &str = "risk";

/// Shown when no rule matched the patient
pub const NO_MATCH_MESSAGE: &str = "Tidak ada aturan yang cocok untuk kondisi input ini.";

/// The rule base, in evaluation order
pub const RULES: [&str; 6] = [
    "IF age IS tua AND trestbps IS tinggi AND chol IS tinggi THEN risk IS tinggi",
    "IF age IS paruh_baya AND trestbps IS normal AND chol IS normal THEN risk IS sedang",
    "IF age IS muda AND trestbps IS rendah AND chol IS rendah THEN risk IS rendah",
    "IF thalach IS tinggi AND oldpeak IS normal THEN risk IS rendah",
    "IF oldpeak IS tinggi OR trestbps IS tinggi THEN risk IS tinggi",
    "IF chol IS tinggi AND oldpeak IS sedang THEN risk IS sedang",
];

/// Summary statistics of one dataset column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl ColumnStats {
    pub const fn new(min: f64, mean: f64, max: f64) -> Self {
        Self { min, mean, max }
    }
}

/// Per-column statistics the membership functions are derived from
///
/// Defaults are those of the 303-row UCI/Kaggle `heart.csv`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetStats {
    pub age: ColumnStats,
    pub trestbps: ColumnStats,
    pub chol: ColumnStats,
    pub thalach: ColumnStats,
    pub oldpeak: ColumnStats,
}

impl Default for DatasetStats {
    fn default() -> Self {
        Self {
            age: ColumnStats::new(29.0, 54.37, 77.0),
            trestbps: ColumnStats::new(94.0, 131.62, 200.0),
            chol: ColumnStats::new(126.0, 246.26, 564.0),
            thalach: ColumnStats::new(71.0, 149.65, 202.0),
            oldpeak: ColumnStats::new(0.0, 1.04, 6.2),
        }
    }
}

impl DatasetStats {
    /// The five input variables with their three-term partitions
    pub fn variables(&self) -> FuzzyResult<Vec<LinguisticVariable>> {
        let spread = |name: &str, labels: [&str; 3], stats: &ColumnStats, step: f64| {
            LinguisticVariable::from_spread(name, labels, stats.min, stats.mean, stats.max, step)
        };
        Ok(vec![
            spread("age", ["muda", "paruh_baya", "tua"], &self.age, 1.0)?,
            spread("trestbps", ["rendah", "normal", "tinggi"], &self.trestbps, 1.0)?,
            spread("chol", ["rendah", "normal", "tinggi"], &self.chol, 1.0)?,
            spread("thalach", ["rendah", "sedang", "tinggi"], &self.thalach, 1.0)?,
            spread("oldpeak", ["normal", "sedang", "tinggi"], &self.oldpeak, 0.1)?,
        ])
    }
}

/// The risk output over [0, 100]
pub fn risk_variable(step: f64) -> FuzzyResult<LinguisticVariable> {
    LinguisticVariable::new(RISK, Universe::new(0.0, 100.0, step)?)
        .with_term("rendah", MembershipFunction::triangular(0.0, 0.0, 40.0)?)?
        .with_term("sedang", MembershipFunction::triangular(30.0, 50.0, 70.0)?)?
        .with_term("tinggi", MembershipFunction::triangular(60.0, 100.0, 100.0)?)
}

/// Build the reference engine
pub fn heart_engine(
    stats: &DatasetStats,
    settings: InferenceSettings,
    risk_step: f64,
) -> FuzzyResult<InferenceEngine> {
    let mut builder = InferenceEngine::builder().settings(settings);
    for var in stats.variables()? {
        builder = builder.input(var);
    }
    builder = builder.output(risk_variable(risk_step)?);
    for (i, text) in RULES.iter().enumerate() {
        builder = builder.rule(parse_rule(text)?.with_name(format!("R{}", i + 1)));
    }
    builder.build()
}

/// Crisp measurements of one patient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientInputs {
    pub age: f64,
    pub trestbps: f64,
    pub chol: f64,
    pub thalach: f64,
    pub oldpeak: f64,
}

impl PatientInputs {
    /// Every measurement at its column mean
    pub fn at_means(stats: &DatasetStats) -> Self {
        Self {
            age: stats.age.mean,
            trestbps: stats.trestbps.mean,
            chol: stats.chol.mean,
            thalach: stats.thalach.mean,
            oldpeak: stats.oldpeak.mean,
        }
    }

    pub fn to_map(&self) -> HashMap<String, f64> {
        [
            ("age", self.age),
            ("trestbps", self.trestbps),
            ("chol", self.chol),
            ("thalach", self.thalach),
            ("oldpeak", self.oldpeak),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }
}

/// Risk band of a crisp score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Rendah,
    Sedang,
    Tinggi,
}

impl RiskCategory {
    /// Scores below 40 are low, below 70 moderate, the rest high
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            RiskCategory::Rendah
        } else if score < 70.0 {
            RiskCategory::Sedang
        } else {
            RiskCategory::Tinggi
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Rendah => "rendah",
            RiskCategory::Sedang => "sedang",
            RiskCategory::Tinggi => "tinggi",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            RiskCategory::Rendah => "Risiko Rendah - Jantung dalam kondisi baik.",
            RiskCategory::Sedang => "Risiko Sedang - Perlu pemeriksaan lanjutan.",
            RiskCategory::Tinggi => "Risiko Tinggi - Segera konsultasi ke dokter jantung.",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of assessing one patient
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub risk: OutputValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<RiskCategory>,
    pub evaluation: Evaluation,
}

impl Assessment {
    /// Advisory text, or the no-match message when no rule fired
    pub fn message(&self) -> &'static str {
        self.category.map_or(NO_MATCH_MESSAGE, |c| c.advice())
    }
}

/// Evaluate a patient against an engine built by [`heart_engine`]
pub fn assess(engine: &InferenceEngine, patient: &PatientInputs) -> FuzzyResult<Assessment> {
    let evaluation = engine.evaluate(&patient.to_map())?;
    let risk = evaluation.output(RISK).ok_or_else(|| {
        crate::fuzzy_error!(ErrorCode::ConfigurationError, "Engine has no '{}' output", RISK)
    })?;
    let category = risk.value().map(RiskCategory::from_score);
    debug!(?patient, ?risk, ?category, "assessed patient");
    Ok(Assessment {
        risk,
        category,
        evaluation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::norm::TNorm;
    use proptest::prelude::*;

    fn engine() -> InferenceEngine {
        heart_engine(&DatasetStats::default(), InferenceSettings::mamdani(), 1.0).unwrap()
    }

    #[test]
    fn test_oldest_patient_is_fully_tua() {
        let stats = DatasetStats {
            age: ColumnStats::new(29.0, 54.0, 77.0),
            ..DatasetStats::default()
        };
        let engine = heart_engine(&stats, InferenceSettings::mamdani(), 1.0).unwrap();
        let age = engine.input("age").unwrap().fuzzify(77.0);
        assert_eq!(age.get("tua").unwrap().value(), 1.0);
        assert_eq!(age.get("paruh_baya").unwrap().value(), 0.0);
        assert_eq!(age.get("muda").unwrap().value(), 0.0);
    }

    #[test]
    fn test_average_patient_is_moderate() {
        let stats = DatasetStats::default();
        let assessment = assess(&engine(), &PatientInputs::at_means(&stats)).unwrap();

        assert_eq!(
            assessment.evaluation.firing_strengths(),
            vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0]
        );
        let risk = assessment.risk.value().unwrap();
        assert!(risk > 30.0 && risk < 70.0);
        assert!((risk - 50.0).abs() < 1e-9);
        assert_eq!(assessment.category, Some(RiskCategory::Sedang));
    }

    #[test]
    fn test_max_oldpeak_is_high_regardless_of_pressure() {
        let stats = DatasetStats::default();
        let patient = PatientInputs {
            age: stats.age.max,
            trestbps: stats.trestbps.min,
            oldpeak: stats.oldpeak.max,
            ..PatientInputs::at_means(&stats)
        };
        let assessment = assess(&engine(), &patient).unwrap();

        assert_eq!(assessment.evaluation.firings[4].strength.value(), 1.0);
        assert_eq!(assessment.evaluation.firings[4].name.as_deref(), Some("R5"));
        let risk = assessment.risk.value().unwrap();
        assert!(risk > 60.0);
        assert!((risk - 87.0).abs() < 1e-9);
        assert_eq!(assessment.category, Some(RiskCategory::Tinggi));
    }

    #[test]
    fn test_max_oldpeak_with_average_patient() {
        let stats = DatasetStats::default();
        let patient = PatientInputs {
            oldpeak: stats.oldpeak.max,
            ..PatientInputs::at_means(&stats)
        };
        let assessment = assess(&engine(), &patient).unwrap();

        let strengths = assessment.evaluation.firing_strengths();
        assert_eq!(strengths[1], 1.0);
        assert_eq!(strengths[4], 1.0);
        let risk = assessment.risk.value().unwrap();
        assert!(risk > 60.0);
        assert!((risk - 68.794).abs() < 1e-3);
    }

    #[test]
    fn test_no_rule_fired_message() {
        // Old patient with otherwise minimal readings: no rule's antecedent holds
        let stats = DatasetStats::default();
        let patient = PatientInputs {
            age: stats.age.max,
            trestbps: stats.trestbps.min,
            chol: stats.chol.min,
            thalach: stats.thalach.min,
            oldpeak: stats.oldpeak.min,
        };
        let assessment = assess(&engine(), &patient).unwrap();

        assert!(!assessment.evaluation.any_rule_fired());
        assert_eq!(assessment.risk, OutputValue::NoRuleFired);
        assert_eq!(assessment.category, None);
        assert_eq!(assessment.message(), NO_MATCH_MESSAGE);
    }

    #[test]
    fn test_category_thresholds() {
        assert_eq!(RiskCategory::from_score(0.0), RiskCategory::Rendah);
        assert_eq!(RiskCategory::from_score(39.99), RiskCategory::Rendah);
        assert_eq!(RiskCategory::from_score(40.0), RiskCategory::Sedang);
        assert_eq!(RiskCategory::from_score(69.99), RiskCategory::Sedang);
        assert_eq!(RiskCategory::from_score(70.0), RiskCategory::Tinggi);
        assert!(RiskCategory::Tinggi.advice().contains("dokter"));
    }

    #[test]
    fn test_rule_base_shape() {
        let engine = engine();
        assert_eq!(engine.rules().len(), 6);
        assert_eq!(engine.required_inputs().len(), 5);
        assert_eq!(engine.rules()[0].name.as_deref(), Some("R1"));
        assert_eq!(engine.rules()[4].to_string(), RULES[4]);
    }

    #[test]
    fn test_default_stats_span_heart_csv() {
        let stats = DatasetStats::default();
        assert_eq!(stats.chol, ColumnStats::new(126.0, 246.26, 564.0));
        let names: Vec<String> = stats
            .variables()
            .unwrap()
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(names, ["age", "trestbps", "chol", "thalach", "oldpeak"]);
    }

    #[test]
    fn test_unusable_risk_step_is_an_error() {
        let stats = DatasetStats::default();
        for step in [1e-300, 1e-9, 0.0, f64::NAN] {
            let err = heart_engine(&stats, InferenceSettings::mamdani(), step).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidUniverse);
        }
    }

    #[test]
    fn test_mean_outside_range_rejected() {
        let stats = DatasetStats {
            chol: ColumnStats::new(126.0, 600.0, 564.0),
            ..DatasetStats::default()
        };
        let err = heart_engine(&stats, InferenceSettings::mamdani(), 1.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
    }

    #[test]
    fn test_product_conjunction_agrees_on_crisp_memberships() {
        let settings = InferenceSettings {
            and: TNorm::Product,
            ..InferenceSettings::mamdani()
        };
        let engine = heart_engine(&DatasetStats::default(), settings, 1.0).unwrap();
        let stats = DatasetStats::default();
        let assessment = assess(&engine, &PatientInputs::at_means(&stats)).unwrap();
        assert!((assessment.risk.value().unwrap() - 50.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_risk_bounded_over_observed_ranges(
            age in 29.0f64..=77.0,
            trestbps in 94.0f64..=200.0,
            chol in 126.0f64..=564.0,
            thalach in 71.0f64..=202.0,
            oldpeak in 0.0f64..=6.2,
        ) {
            let patient = PatientInputs { age, trestbps, chol, thalach, oldpeak };
            for settings in [InferenceSettings::mamdani(), InferenceSettings::larsen()] {
                let engine = heart_engine(&DatasetStats::default(), settings, 1.0).unwrap();
                let assessment = assess(&engine, &patient).unwrap();

                for strength in assessment.evaluation.firing_strengths() {
                    prop_assert!((0.0..=1.0).contains(&strength));
                }
                match assessment.risk {
                    OutputValue::NoRuleFired => prop_assert!(assessment.category.is_none()),
                    OutputValue::Crisp(risk) => prop_assert!((0.0..=100.0).contains(&risk)),
                }
            }
        }
    }
}
