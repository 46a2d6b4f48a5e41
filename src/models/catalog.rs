use serde::{Deserialize, Serialize};

use crate::services::normalizer::normalize_category_label;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CareAtHome,
    MedicineDelivery,
    LabTest,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::CareAtHome,
        Category::MedicineDelivery,
        Category::LabTest,
    ];

    /// Canonical lowercase label, as exchanged with the extractor.
    pub fn label(&self) -> &'static str {
        match self {
            Category::CareAtHome => "care at home",
            Category::MedicineDelivery => "medicine delivery",
            Category::LabTest => "lab test",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::CareAtHome => "Care at Home",
            Category::MedicineDelivery => "Medicine Delivery",
            Category::LabTest => "Lab Test",
        }
    }

    pub fn button_id(&self) -> &'static str {
        match self {
            Category::CareAtHome => "care_at_home",
            Category::MedicineDelivery => "medicine_delivery",
            Category::LabTest => "lab_test",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = normalize_category_label(label);
        Self::ALL.into_iter().find(|c| c.label() == wanted)
    }

    pub fn from_button_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.button_id() == id)
    }

    pub fn sub_categories(&self) -> &'static [SubCategory] {
        match self {
            Category::CareAtHome => &[
                SubCategory::NurseVisit,
                SubCategory::Physiotherapy,
                SubCategory::ElderlyCare,
                SubCategory::PostSurgeryCare,
            ],
            Category::MedicineDelivery => &[
                SubCategory::RegularMedicines,
                SubCategory::UrgentMedicines,
                SubCategory::UploadPrescription,
                SubCategory::TypeTheMedicine,
            ],
            Category::LabTest => &[
                SubCategory::BloodTest,
                SubCategory::UrineTest,
                SubCategory::CovidTest,
                SubCategory::FullBodyCheckup,
            ],
        }
    }

    pub fn allows(&self, sub: SubCategory) -> bool {
        self.sub_categories().contains(&sub)
    }

    /// Prompt body shown with the sub-category options.
    pub fn sub_category_question(&self) -> &'static str {
        match self {
            Category::CareAtHome => "Select a subcategory for Care at Home:",
            Category::MedicineDelivery => "How would you like to provide the medicine details?",
            Category::LabTest => "Select a subcategory for Lab Test:",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubCategory {
    NurseVisit,
    Physiotherapy,
    ElderlyCare,
    PostSurgeryCare,
    RegularMedicines,
    UrgentMedicines,
    UploadPrescription,
    TypeTheMedicine,
    BloodTest,
    UrineTest,
    CovidTest,
    FullBodyCheckup,
}

impl SubCategory {
    pub const ALL: [SubCategory; 12] = [
        SubCategory::NurseVisit,
        SubCategory::Physiotherapy,
        SubCategory::ElderlyCare,
        SubCategory::PostSurgeryCare,
        SubCategory::RegularMedicines,
        SubCategory::UrgentMedicines,
        SubCategory::UploadPrescription,
        SubCategory::TypeTheMedicine,
        SubCategory::BloodTest,
        SubCategory::UrineTest,
        SubCategory::CovidTest,
        SubCategory::FullBodyCheckup,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SubCategory::NurseVisit => "nurse visit",
            SubCategory::Physiotherapy => "physiotherapy",
            SubCategory::ElderlyCare => "elderly care",
            SubCategory::PostSurgeryCare => "post surgery care",
            SubCategory::RegularMedicines => "regular medicines",
            SubCategory::UrgentMedicines => "urgent medicines",
            SubCategory::UploadPrescription => "upload prescription",
            SubCategory::TypeTheMedicine => "type the medicine",
            SubCategory::BloodTest => "blood test",
            SubCategory::UrineTest => "urine test",
            SubCategory::CovidTest => "covid test",
            SubCategory::FullBodyCheckup => "full body checkup",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SubCategory::NurseVisit => "Nurse Visit",
            SubCategory::Physiotherapy => "Physiotherapy",
            SubCategory::ElderlyCare => "Elderly Care",
            SubCategory::PostSurgeryCare => "Post Surgery Care",
            SubCategory::RegularMedicines => "Regular Medicines",
            SubCategory::UrgentMedicines => "Urgent Medicines",
            SubCategory::UploadPrescription => "Send Prescription",
            SubCategory::TypeTheMedicine => "Type Medicine",
            SubCategory::BloodTest => "Blood Test",
            SubCategory::UrineTest => "Urine Test",
            SubCategory::CovidTest => "COVID Test",
            SubCategory::FullBodyCheckup => "Full Body Checkup",
        }
    }

    pub fn button_id(&self) -> &'static str {
        match self {
            SubCategory::NurseVisit => "nurse_visit",
            SubCategory::Physiotherapy => "physiotherapy",
            SubCategory::ElderlyCare => "elderly_care",
            SubCategory::PostSurgeryCare => "post_surgery_care",
            SubCategory::RegularMedicines => "regular_meds",
            SubCategory::UrgentMedicines => "urgent_meds",
            SubCategory::UploadPrescription => "upload_prescription",
            SubCategory::TypeTheMedicine => "type_the_medicine",
            SubCategory::BloodTest => "blood_test",
            SubCategory::UrineTest => "urine_test",
            SubCategory::CovidTest => "covid_test",
            SubCategory::FullBodyCheckup => "full_body_checkup",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let wanted = normalize_category_label(label);
        Self::ALL.into_iter().find(|s| s.label() == wanted)
    }

    pub fn from_button_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.button_id() == id)
    }

    /// The single category whose allowed set contains this sub-category.
    pub fn category(&self) -> Category {
        match self {
            SubCategory::NurseVisit
            | SubCategory::Physiotherapy
            | SubCategory::ElderlyCare
            | SubCategory::PostSurgeryCare => Category::CareAtHome,
            SubCategory::RegularMedicines
            | SubCategory::UrgentMedicines
            | SubCategory::UploadPrescription
            | SubCategory::TypeTheMedicine => Category::MedicineDelivery,
            SubCategory::BloodTest
            | SubCategory::UrineTest
            | SubCategory::CovidTest
            | SubCategory::FullBodyCheckup => Category::LabTest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse_loosely() {
        assert_eq!(Category::from_label("Lab_Test "), Some(Category::LabTest));
        assert_eq!(Category::from_label("care-at-home"), Some(Category::CareAtHome));
        assert_eq!(Category::from_label("dentistry"), None);
        assert_eq!(SubCategory::from_label("Blood Test"), Some(SubCategory::BloodTest));
    }

    #[test]
    fn test_every_sub_category_belongs_to_its_parent() {
        for sub in SubCategory::ALL {
            assert!(sub.category().allows(sub), "{sub:?}");
            let owners = Category::ALL.iter().filter(|c| c.allows(sub)).count();
            assert_eq!(owners, 1, "{sub:?}");
        }
    }

    #[test]
    fn test_button_ids_round_trip() {
        for cat in Category::ALL {
            assert_eq!(Category::from_button_id(cat.button_id()), Some(cat));
        }
        assert_eq!(SubCategory::from_button_id("urgent_meds"), Some(SubCategory::UrgentMedicines));
        assert_eq!(SubCategory::from_button_id("nope"), None);
    }
}
