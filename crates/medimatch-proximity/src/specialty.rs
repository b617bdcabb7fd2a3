//! Condition and symptom text to canonical specialty names.

use std::collections::BTreeSet;

use medimatch_core::{load_specialty_dictionary, AppConfig, ConfigError, SpecialtyDictionaryFile};

/// Version tag of the built-in keyword table.
pub const DICTIONARY_VERSION: &str = "2026.1";

const BUILTIN: &[(&str, &[&str])] = &[
    // cardiac
    ("chest pain", &["Cardiology", "Emergency Medicine"]),
    ("heart", &["Cardiology"]),
    ("cardiac", &["Cardiology"]),
    ("palpitation", &["Cardiology"]),
    ("blood pressure", &["Cardiology", "General Medicine"]),
    ("hypertension", &["Cardiology", "General Medicine"]),
    ("cholesterol", &["Cardiology"]),
    // endocrine
    ("diabetes", &["Endocrinology"]),
    ("thyroid", &["Endocrinology"]),
    ("hormone", &["Endocrinology"]),
    ("hormonal", &["Endocrinology"]),
    ("obesity", &["Endocrinology", "General Medicine"]),
    // skin
    ("skin", &["Dermatology"]),
    ("rash", &["Dermatology"]),
    ("acne", &["Dermatology"]),
    ("eczema", &["Dermatology"]),
    ("psoriasis", &["Dermatology"]),
    ("hair loss", &["Dermatology"]),
    // respiratory
    ("asthma", &["Pulmonology"]),
    ("cough", &["Pulmonology", "General Medicine"]),
    ("coughing", &["Pulmonology", "General Medicine"]),
    ("breath", &["Pulmonology"]),
    ("breathing", &["Pulmonology"]),
    ("breathless", &["Pulmonology"]),
    ("lung", &["Pulmonology"]),
    ("pneumonia", &["Pulmonology"]),
    ("tuberculosis", &["Pulmonology"]),
    // neurological
    ("headache", &["Neurology"]),
    ("migraine", &["Neurology"]),
    ("seizure", &["Neurology"]),
    ("epilepsy", &["Neurology"]),
    ("stroke", &["Neurology", "Emergency Medicine"]),
    ("dizziness", &["Neurology", "ENT"]),
    ("numbness", &["Neurology"]),
    // orthopedic
    ("fracture", &["Orthopedics", "Emergency Medicine"]),
    ("fractured", &["Orthopedics", "Emergency Medicine"]),
    ("joint", &["Orthopedics"]),
    ("back pain", &["Orthopedics"]),
    ("arthritis", &["Orthopedics", "Rheumatology"]),
    ("bone", &["Orthopedics"]),
    ("sprain", &["Orthopedics"]),
    // gastro
    ("stomach", &["Gastroenterology"]),
    ("abdominal", &["Gastroenterology"]),
    ("diarrhea", &["Gastroenterology", "General Medicine"]),
    ("vomit", &["Gastroenterology", "General Medicine"]),
    ("vomiting", &["Gastroenterology", "General Medicine"]),
    ("acidity", &["Gastroenterology"]),
    ("heartburn", &["Gastroenterology"]),
    ("liver", &["Gastroenterology", "Hepatology"]),
    ("jaundice", &["Gastroenterology", "Hepatology"]),
    // renal and urology
    ("kidney", &["Nephrology"]),
    ("dialysis", &["Nephrology"]),
    ("urine", &["Urology"]),
    ("urinary", &["Urology"]),
    ("prostate", &["Urology"]),
    // ENT and eye
    ("ear pain", &["ENT"]),
    ("earache", &["ENT"]),
    ("throat", &["ENT"]),
    ("sinus", &["ENT"]),
    ("hearing", &["ENT"]),
    ("eye", &["Ophthalmology"]),
    ("vision", &["Ophthalmology"]),
    ("cataract", &["Ophthalmology"]),
    // mental health
    ("anxiety", &["Psychiatry"]),
    ("depression", &["Psychiatry"]),
    ("insomnia", &["Psychiatry", "Neurology"]),
    ("stress", &["Psychiatry"]),
    // pediatric
    ("child", &["Pediatrics"]),
    ("children", &["Pediatrics"]),
    ("infant", &["Pediatrics"]),
    ("baby", &["Pediatrics"]),
    // gynecological
    ("pregnancy", &["Gynecology", "Obstetrics"]),
    ("pregnant", &["Gynecology", "Obstetrics"]),
    ("menstrual", &["Gynecology"]),
    ("menstruation", &["Gynecology"]),
    ("period", &["Gynecology"]),
    ("pcos", &["Gynecology", "Endocrinology"]),
    // oncology
    ("cancer", &["Oncology"]),
    ("tumor", &["Oncology"]),
    ("tumour", &["Oncology"]),
    ("lump", &["Oncology", "General Surgery"]),
    // general
    ("fever", &["General Medicine"]),
    ("cold", &["General Medicine"]),
    ("flu", &["General Medicine"]),
    ("fatigue", &["General Medicine"]),
    ("infection", &["General Medicine"]),
    ("dengue", &["General Medicine"]),
    ("malaria", &["General Medicine"]),
    ("injury", &["Emergency Medicine", "Orthopedics"]),
    ("injuries", &["Emergency Medicine", "Orthopedics"]),
    ("burn", &["Emergency Medicine", "Dermatology"]),
    ("tooth", &["Dentistry"]),
    ("teeth", &["Dentistry"]),
    ("toothache", &["Dentistry"]),
    ("dental", &["Dentistry"]),
];

/// Lower-cased alphanumeric words of `text`.
pub(crate) fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// `true` when `phrase` occurs in `text` as a run of whole words. With
/// `plural_tail` the last word may also carry an `s` or `es` suffix.
pub(crate) fn contains_phrase(text: &[String], phrase: &[String], plural_tail: bool) -> bool {
    let Some((last, head)) = phrase.split_last() else {
        return false;
    };
    if text.len() < phrase.len() {
        return false;
    }
    text.windows(phrase.len()).any(|window| {
        window.split_last().is_some_and(|(window_last, window_head)| {
            window_head == head && word_matches(window_last, last, plural_tail)
        })
    })
}

fn word_matches(word: &str, wanted: &str, plural_tail: bool) -> bool {
    word == wanted
        || (plural_tail
            && word
                .strip_prefix(wanted)
                .is_some_and(|rest| rest == "s" || rest == "es"))
}

#[derive(Debug, Clone)]
struct Entry {
    keyword: Vec<String>,
    specialties: Vec<String>,
}

/// Static, versioned keyword table. Pure lookups, no I/O.
#[derive(Debug, Clone)]
pub struct SpecialtyMapper {
    version: String,
    entries: Vec<Entry>,
}

impl Default for SpecialtyMapper {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SpecialtyMapper {
    #[must_use]
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(keyword, specialties)| Entry {
                keyword: words(keyword),
                specialties: specialties.iter().map(ToString::to_string).collect(),
            })
            .collect();
        Self {
            version: DICTIONARY_VERSION.to_string(),
            entries,
        }
    }

    /// Replaces the built-in table with an operator-supplied dictionary.
    /// Expects a file that already passed `load_specialty_dictionary` validation.
    #[must_use]
    pub fn from_dictionary(dictionary: &SpecialtyDictionaryFile) -> Self {
        let entries = dictionary
            .entries
            .iter()
            .map(|entry| Entry {
                keyword: words(&entry.keyword),
                specialties: entry
                    .specialties
                    .iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            })
            .collect();
        Self {
            version: dictionary.version.trim().to_string(),
            entries,
        }
    }

    /// The dictionary at `specialty_dictionary_path` when configured, else
    /// the built-in table.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configured file cannot be read or is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        match config.specialty_dictionary_path.as_deref() {
            Some(path) => {
                let dictionary = load_specialty_dictionary(path)?;
                tracing::info!(
                    path = %path.display(),
                    version = %dictionary.version,
                    entries = dictionary.entries.len(),
                    "loaded specialty dictionary"
                );
                Ok(Self::from_dictionary(&dictionary))
            }
            None => Ok(Self::builtin()),
        }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Union of the specialties whose keyword occurs in any condition.
    ///
    /// Keywords match whole words, so `burn` does not fire on "heartburn";
    /// a plural `s`/`es` on the last word is accepted. Case-insensitive and
    /// order-independent. Empty when nothing matches.
    #[must_use]
    pub fn map_conditions<S: AsRef<str>>(&self, conditions: &[S]) -> BTreeSet<String> {
        let mut specialties = BTreeSet::new();
        for condition in conditions {
            specialties.extend(self.map_one(condition.as_ref()));
        }
        specialties
    }

    /// Like [`Self::map_conditions`], but a non-blank text that matches no
    /// keyword is kept as a specialty name in its own right.
    #[must_use]
    pub fn specialties_for_query<S: AsRef<str>>(&self, texts: &[S]) -> BTreeSet<String> {
        let mut specialties = BTreeSet::new();
        for text in texts {
            let text = text.as_ref().trim();
            if text.is_empty() {
                continue;
            }
            let mapped = self.map_one(text);
            if mapped.is_empty() {
                specialties.insert(text.to_string());
            } else {
                specialties.extend(mapped);
            }
        }
        specialties
    }

    fn map_one(&self, condition: &str) -> BTreeSet<String> {
        let condition = words(condition);
        if condition.is_empty() {
            return BTreeSet::new();
        }
        self.entries
            .iter()
            .filter(|entry| contains_phrase(&condition, &entry.keyword, true))
            .flat_map(|entry| entry.specialties.iter().cloned())
            .collect()
    }
}
