// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document-type catalogue: the closed set of issuable documents and the
// static profile (required fields, feature matrix, MRZ format, page size,
// demanded checks, validity) that drives the single generic renderer.

use serde::{Deserialize, Serialize};

use crate::features::SecurityFeatureMatrix;
use crate::types::{CheckKind, DocumentRequest, attr};

/// Every document type the engine can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    SmartIdCard,
    IdentityBook,
    TemporaryIdCertificate,
    BirthCertificate,
    DeathCertificate,
    MarriageCertificate,
    DivorceCertificate,
    OrdinaryPassport,
    DiplomaticPassport,
    OfficialPassport,
    EmergencyTravelCertificate,
    RefugeeTravelDocument,
    GeneralWorkVisa,
    CriticalSkillsVisa,
    IntraCompanyTransferVisa,
    BusinessVisa,
    StudyPermit,
    VisitorVisa,
    PermanentResidencePermit,
    AsylumSeekerPermit,
    NaturalisationCertificate,
}

/// ICAO-9303 machine-readable zone layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MrzFormat {
    /// ID-1 card: 3 lines of 30.
    Td1,
    /// ID-2 card / visa: 2 lines of 36.
    Td2,
    /// Passport booklet: 2 lines of 44.
    Td3,
}

impl MrzFormat {
    pub fn line_count(&self) -> usize {
        match self {
            Self::Td1 => 3,
            Self::Td2 | Self::Td3 => 2,
        }
    }

    pub fn line_length(&self) -> usize {
        match self {
            Self::Td1 => 30,
            Self::Td2 => 36,
            Self::Td3 => 44,
        }
    }
}

/// MRZ configuration of a document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MrzSpec {
    pub format: MrzFormat,
    /// Two-character ICAO document code, e.g. `P<` or `ID`.
    pub document_code: &'static str,
}

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageGeometry {
    pub const ID1_CARD: Self = Self { width_mm: 85.6, height_mm: 54.0 };
    pub const ID2_CARD: Self = Self { width_mm: 105.0, height_mm: 74.0 };
    pub const PASSPORT_PAGE: Self = Self { width_mm: 125.0, height_mm: 88.0 };
    pub const A4: Self = Self { width_mm: 210.0, height_mm: 297.0 };
}

/// A field a document type insists on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Surname,
    GivenNames,
    DateOfBirth,
    Nationality,
    Sex,
    IdNumber,
    /// A key in `DocumentRequest::attributes`.
    Attribute(&'static str),
}

impl RequiredField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Surname => "surname",
            Self::GivenNames => "givenNames",
            Self::DateOfBirth => "dateOfBirth",
            Self::Nationality => "nationality",
            Self::Sex => "sex",
            Self::IdNumber => "idNumber",
            Self::Attribute(key) => *key,
        }
    }

    /// Whether `request` carries a non-blank value for this field.
    pub fn is_present(&self, request: &DocumentRequest) -> bool {
        let p = &request.personal;
        match self {
            Self::Surname => !p.surname.trim().is_empty(),
            Self::GivenNames => !p.given_names.trim().is_empty(),
            Self::DateOfBirth => p.date_of_birth.is_some(),
            Self::Nationality => !p.nationality.trim().is_empty(),
            Self::Sex => p.sex.is_some(),
            Self::IdNumber => p.id_number.as_deref().is_some_and(|v| !v.trim().is_empty()),
            Self::Attribute(key) => request.attribute(key).is_some(),
        }
    }
}

/// Static per-type configuration record.
#[derive(Debug, Clone, Copy)]
pub struct DocumentProfile {
    /// Short uppercase code used in hashtags, QR payloads and logs.
    pub code: &'static str,
    pub title: &'static str,
    pub mrz: Option<MrzSpec>,
    pub page: PageGeometry,
    pub required_fields: &'static [RequiredField],
    pub features: SecurityFeatureMatrix,
    pub checks: &'static [CheckKind],
    /// Fixed validity from the issue date; `None` means the request's
    /// `validUntil` attribute (if any) decides.
    pub validity_days: Option<u32>,
    /// First character of generated document numbers.
    pub number_prefix: char,
    pub serial_prefix: &'static str,
}

impl DocumentProfile {
    /// Names of every required field missing from `request`, in profile order.
    pub fn missing_fields(&self, request: &DocumentRequest) -> Vec<String> {
        self.required_fields
            .iter()
            .filter(|f| !f.is_present(request))
            .map(|f| f.name().to_owned())
            .collect()
    }

    pub fn requires(&self, check: CheckKind) -> bool {
        self.checks.contains(&check)
    }
}

// -- Field lists --------------------------------------------------------------

use RequiredField::{DateOfBirth, GivenNames, IdNumber, Nationality, Sex, Surname};

const CITIZEN_CORE: &[RequiredField] = &[Surname, GivenNames, DateOfBirth, Nationality, Sex, IdNumber];

const ID_BOOK_FIELDS: &[RequiredField] = &[Surname, GivenNames, DateOfBirth, Nationality, IdNumber];
const TEMP_ID_FIELDS: &[RequiredField] = &[Surname, GivenNames, DateOfBirth, IdNumber];
const BIRTH_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    DateOfBirth,
    Sex,
    RequiredField::Attribute(attr::PLACE_OF_BIRTH),
];
const DEATH_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    IdNumber,
    RequiredField::Attribute(attr::DATE_OF_DEATH),
];
const MARRIAGE_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    RequiredField::Attribute(attr::SPOUSE_NAME),
    RequiredField::Attribute(attr::DATE_OF_MARRIAGE),
];
const DIVORCE_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    RequiredField::Attribute(attr::SPOUSE_NAME),
    RequiredField::Attribute(attr::DATE_OF_DIVORCE),
];
const EMERGENCY_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    DateOfBirth,
    Nationality,
    Sex,
    RequiredField::Attribute(attr::DESTINATION),
];
const REFUGEE_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    DateOfBirth,
    Nationality,
    Sex,
    RequiredField::Attribute(attr::COUNTRY_OF_ORIGIN),
];
const WORK_VISA_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    DateOfBirth,
    Nationality,
    Sex,
    RequiredField::Attribute(attr::EMPLOYER),
    RequiredField::Attribute(attr::VALID_FROM),
    RequiredField::Attribute(attr::VALID_UNTIL),
];
const CRITICAL_SKILLS_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    DateOfBirth,
    Nationality,
    Sex,
    RequiredField::Attribute(attr::CATEGORY),
    RequiredField::Attribute(attr::VALID_FROM),
    RequiredField::Attribute(attr::VALID_UNTIL),
];
const PURPOSE_VISA_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    DateOfBirth,
    Nationality,
    Sex,
    RequiredField::Attribute(attr::PURPOSE),
    RequiredField::Attribute(attr::VALID_FROM),
    RequiredField::Attribute(attr::VALID_UNTIL),
];
const STUDY_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    DateOfBirth,
    Nationality,
    Sex,
    RequiredField::Attribute(attr::INSTITUTION),
    RequiredField::Attribute(attr::VALID_FROM),
    RequiredField::Attribute(attr::VALID_UNTIL),
];
const RESIDENCE_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    DateOfBirth,
    Nationality,
    Sex,
    RequiredField::Attribute(attr::CATEGORY),
    RequiredField::Attribute(attr::FILE_NUMBER),
];
const ASYLUM_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    DateOfBirth,
    Nationality,
    Sex,
    RequiredField::Attribute(attr::COUNTRY_OF_ORIGIN),
    RequiredField::Attribute(attr::FILE_NUMBER),
    RequiredField::Attribute(attr::VALID_UNTIL),
];
const NATURALISATION_FIELDS: &[RequiredField] = &[
    Surname,
    GivenNames,
    DateOfBirth,
    IdNumber,
    RequiredField::Attribute(attr::COUNTRY_OF_ORIGIN),
    RequiredField::Attribute(attr::FILE_NUMBER),
];

// -- Feature matrices ---------------------------------------------------------

const CARD: SecurityFeatureMatrix = SecurityFeatureMatrix {
    uv: true,
    holographic: true,
    braille: true,
    mrz: true,
    barcode: true,
    microprinting: true,
    guilloche: true,
    ghost_image: true,
    rainbow_printing: true,
    metameric: true,
    retroreflective: true,
    qr_code: true,
    ..SecurityFeatureMatrix::NONE
};

const BOOKLET: SecurityFeatureMatrix = SecurityFeatureMatrix {
    uv: true,
    barcode: true,
    microprinting: true,
    security_thread: true,
    invisible_fibers: true,
    guilloche: true,
    watermark: true,
    braille: true,
    qr_code: true,
    ..SecurityFeatureMatrix::NONE
};

const CERTIFICATE: SecurityFeatureMatrix = SecurityFeatureMatrix {
    uv: true,
    barcode: true,
    microprinting: true,
    invisible_fibers: true,
    guilloche: true,
    anti_copy: true,
    void_pantograph: true,
    embossed_seal: true,
    watermark: true,
    qr_code: true,
    ..SecurityFeatureMatrix::NONE
};

const PASSPORT: SecurityFeatureMatrix = SecurityFeatureMatrix {
    uv: true,
    holographic: true,
    mrz: true,
    barcode: true,
    microprinting: true,
    security_thread: true,
    invisible_fibers: true,
    guilloche: true,
    ghost_image: true,
    rainbow_printing: true,
    metameric: true,
    perforation: true,
    retroreflective: true,
    qr_code: true,
    ..SecurityFeatureMatrix::NONE
};

const SERVICE_PASSPORT: SecurityFeatureMatrix = SecurityFeatureMatrix {
    embossed_seal: true,
    thermochromic: true,
    ..PASSPORT
};

const TRAVEL_CERTIFICATE: SecurityFeatureMatrix = SecurityFeatureMatrix {
    uv: true,
    mrz: true,
    barcode: true,
    microprinting: true,
    guilloche: true,
    anti_copy: true,
    watermark: true,
    qr_code: true,
    ..SecurityFeatureMatrix::NONE
};

const VISA: SecurityFeatureMatrix = SecurityFeatureMatrix {
    uv: true,
    holographic: true,
    mrz: true,
    barcode: true,
    microprinting: true,
    guilloche: true,
    rainbow_printing: true,
    thermochromic: true,
    metameric: true,
    watermark: true,
    qr_code: true,
    ..SecurityFeatureMatrix::NONE
};

const RESIDENCE: SecurityFeatureMatrix = SecurityFeatureMatrix {
    ghost_image: true,
    retroreflective: true,
    ..VISA
};

// -- Catalogue ----------------------------------------------------------------

const IDENTITY_AND_BIOMETRIC: &[CheckKind] = &[CheckKind::Identity, CheckKind::Biometric];
const IDENTITY_ONLY: &[CheckKind] = &[CheckKind::Identity];
const BIOMETRIC_ONLY: &[CheckKind] = &[CheckKind::Biometric];
const NO_CHECKS: &[CheckKind] = &[];

const fn mrz(format: MrzFormat, document_code: &'static str) -> Option<MrzSpec> {
    Some(MrzSpec {
        format,
        document_code,
    })
}

impl DocumentType {
    /// Every issuable type.
    pub const ALL: [DocumentType; 21] = [
        Self::SmartIdCard,
        Self::IdentityBook,
        Self::TemporaryIdCertificate,
        Self::BirthCertificate,
        Self::DeathCertificate,
        Self::MarriageCertificate,
        Self::DivorceCertificate,
        Self::OrdinaryPassport,
        Self::DiplomaticPassport,
        Self::OfficialPassport,
        Self::EmergencyTravelCertificate,
        Self::RefugeeTravelDocument,
        Self::GeneralWorkVisa,
        Self::CriticalSkillsVisa,
        Self::IntraCompanyTransferVisa,
        Self::BusinessVisa,
        Self::StudyPermit,
        Self::VisitorVisa,
        Self::PermanentResidencePermit,
        Self::AsylumSeekerPermit,
        Self::NaturalisationCertificate,
    ];

    /// The static profile for this type.
    pub fn profile(&self) -> DocumentProfile {
        match self {
            Self::SmartIdCard => DocumentProfile {
                code: "SMART_ID",
                title: "Smart ID Card",
                mrz: mrz(MrzFormat::Td1, "ID"),
                page: PageGeometry::ID1_CARD,
                required_fields: CITIZEN_CORE,
                features: CARD,
                checks: IDENTITY_AND_BIOMETRIC,
                validity_days: Some(3652),
                number_prefix: 'I',
                serial_prefix: "SID",
            },
            Self::IdentityBook => DocumentProfile {
                code: "ID_BOOK",
                title: "Identity Document",
                mrz: None,
                page: PageGeometry::PASSPORT_PAGE,
                required_fields: ID_BOOK_FIELDS,
                features: BOOKLET,
                checks: IDENTITY_ONLY,
                validity_days: None,
                number_prefix: 'B',
                serial_prefix: "IDB",
            },
            Self::TemporaryIdCertificate => DocumentProfile {
                code: "TEMP_ID",
                title: "Temporary Identity Certificate",
                mrz: None,
                page: PageGeometry::A4,
                required_fields: TEMP_ID_FIELDS,
                features: CERTIFICATE,
                checks: IDENTITY_ONLY,
                validity_days: Some(183),
                number_prefix: 'T',
                serial_prefix: "TIC",
            },
            Self::BirthCertificate => DocumentProfile {
                code: "BIRTH_CERT",
                title: "Unabridged Birth Certificate",
                mrz: None,
                page: PageGeometry::A4,
                required_fields: BIRTH_FIELDS,
                features: CERTIFICATE,
                checks: NO_CHECKS,
                validity_days: None,
                number_prefix: 'H',
                serial_prefix: "BRC",
            },
            Self::DeathCertificate => DocumentProfile {
                code: "DEATH_CERT",
                title: "Death Certificate",
                mrz: None,
                page: PageGeometry::A4,
                required_fields: DEATH_FIELDS,
                features: CERTIFICATE,
                checks: NO_CHECKS,
                validity_days: None,
                number_prefix: 'X',
                serial_prefix: "DTC",
            },
            Self::MarriageCertificate => DocumentProfile {
                code: "MARRIAGE_CERT",
                title: "Marriage Certificate",
                mrz: None,
                page: PageGeometry::A4,
                required_fields: MARRIAGE_FIELDS,
                features: CERTIFICATE,
                checks: IDENTITY_ONLY,
                validity_days: None,
                number_prefix: 'M',
                serial_prefix: "MRC",
            },
            Self::DivorceCertificate => DocumentProfile {
                code: "DIVORCE_CERT",
                title: "Divorce Certificate",
                mrz: None,
                page: PageGeometry::A4,
                required_fields: DIVORCE_FIELDS,
                features: CERTIFICATE,
                checks: IDENTITY_ONLY,
                validity_days: None,
                number_prefix: 'K',
                serial_prefix: "DVC",
            },
            Self::OrdinaryPassport => DocumentProfile {
                code: "PASSPORT",
                title: "Passport",
                mrz: mrz(MrzFormat::Td3, "P<"),
                page: PageGeometry::PASSPORT_PAGE,
                required_fields: CITIZEN_CORE,
                features: PASSPORT,
                checks: IDENTITY_AND_BIOMETRIC,
                validity_days: Some(3652),
                number_prefix: 'A',
                serial_prefix: "PSP",
            },
            Self::DiplomaticPassport => DocumentProfile {
                code: "DIPLOMATIC_PASSPORT",
                title: "Diplomatic Passport",
                mrz: mrz(MrzFormat::Td3, "PD"),
                page: PageGeometry::PASSPORT_PAGE,
                required_fields: CITIZEN_CORE,
                features: SERVICE_PASSPORT,
                checks: IDENTITY_AND_BIOMETRIC,
                validity_days: Some(1826),
                number_prefix: 'D',
                serial_prefix: "DPP",
            },
            Self::OfficialPassport => DocumentProfile {
                code: "OFFICIAL_PASSPORT",
                title: "Official Passport",
                mrz: mrz(MrzFormat::Td3, "PO"),
                page: PageGeometry::PASSPORT_PAGE,
                required_fields: CITIZEN_CORE,
                features: SERVICE_PASSPORT,
                checks: IDENTITY_AND_BIOMETRIC,
                validity_days: Some(1826),
                number_prefix: 'O',
                serial_prefix: "OPP",
            },
            Self::EmergencyTravelCertificate => DocumentProfile {
                code: "EMERGENCY_TRAVEL",
                title: "Emergency Travel Certificate",
                mrz: mrz(MrzFormat::Td3, "PE"),
                page: PageGeometry::PASSPORT_PAGE,
                required_fields: EMERGENCY_FIELDS,
                features: TRAVEL_CERTIFICATE,
                checks: IDENTITY_ONLY,
                validity_days: Some(30),
                number_prefix: 'E',
                serial_prefix: "ETC",
            },
            Self::RefugeeTravelDocument => DocumentProfile {
                code: "REFUGEE_TRAVEL",
                title: "Refugee Travel Document",
                mrz: mrz(MrzFormat::Td3, "PR"),
                page: PageGeometry::PASSPORT_PAGE,
                required_fields: REFUGEE_FIELDS,
                features: TRAVEL_CERTIFICATE,
                checks: IDENTITY_AND_BIOMETRIC,
                validity_days: Some(730),
                number_prefix: 'R',
                serial_prefix: "RTD",
            },
            Self::GeneralWorkVisa => DocumentProfile {
                code: "WORK_VISA",
                title: "General Work Visa",
                mrz: mrz(MrzFormat::Td2, "V<"),
                page: PageGeometry::ID2_CARD,
                required_fields: WORK_VISA_FIELDS,
                features: VISA,
                checks: IDENTITY_ONLY,
                validity_days: None,
                number_prefix: 'W',
                serial_prefix: "GWV",
            },
            Self::CriticalSkillsVisa => DocumentProfile {
                code: "CRITICAL_SKILLS_VISA",
                title: "Critical Skills Work Visa",
                mrz: mrz(MrzFormat::Td2, "V<"),
                page: PageGeometry::ID2_CARD,
                required_fields: CRITICAL_SKILLS_FIELDS,
                features: VISA,
                checks: IDENTITY_ONLY,
                validity_days: None,
                number_prefix: 'C',
                serial_prefix: "CSV",
            },
            Self::IntraCompanyTransferVisa => DocumentProfile {
                code: "ICT_VISA",
                title: "Intra-Company Transfer Work Visa",
                mrz: mrz(MrzFormat::Td2, "V<"),
                page: PageGeometry::ID2_CARD,
                required_fields: WORK_VISA_FIELDS,
                features: VISA,
                checks: IDENTITY_ONLY,
                validity_days: None,
                number_prefix: 'J',
                serial_prefix: "ICT",
            },
            Self::BusinessVisa => DocumentProfile {
                code: "BUSINESS_VISA",
                title: "Business Visa",
                mrz: mrz(MrzFormat::Td2, "V<"),
                page: PageGeometry::ID2_CARD,
                required_fields: PURPOSE_VISA_FIELDS,
                features: VISA,
                checks: IDENTITY_ONLY,
                validity_days: None,
                number_prefix: 'U',
                serial_prefix: "BUS",
            },
            Self::StudyPermit => DocumentProfile {
                code: "STUDY_PERMIT",
                title: "Study Visa",
                mrz: mrz(MrzFormat::Td2, "V<"),
                page: PageGeometry::ID2_CARD,
                required_fields: STUDY_FIELDS,
                features: VISA,
                checks: IDENTITY_ONLY,
                validity_days: None,
                number_prefix: 'S',
                serial_prefix: "STP",
            },
            Self::VisitorVisa => DocumentProfile {
                code: "VISITOR_VISA",
                title: "Visitor's Visa",
                mrz: mrz(MrzFormat::Td2, "V<"),
                page: PageGeometry::ID2_CARD,
                required_fields: PURPOSE_VISA_FIELDS,
                features: VISA,
                checks: NO_CHECKS,
                validity_days: None,
                number_prefix: 'V',
                serial_prefix: "VIS",
            },
            Self::PermanentResidencePermit => DocumentProfile {
                code: "PERMANENT_RESIDENCE",
                title: "Permanent Residence Permit",
                mrz: mrz(MrzFormat::Td2, "IR"),
                page: PageGeometry::ID2_CARD,
                required_fields: RESIDENCE_FIELDS,
                features: RESIDENCE,
                checks: IDENTITY_AND_BIOMETRIC,
                validity_days: None,
                number_prefix: 'P',
                serial_prefix: "PRP",
            },
            Self::AsylumSeekerPermit => DocumentProfile {
                code: "ASYLUM_PERMIT",
                title: "Asylum Seeker Temporary Visa",
                mrz: None,
                page: PageGeometry::A4,
                required_fields: ASYLUM_FIELDS,
                features: CERTIFICATE,
                checks: BIOMETRIC_ONLY,
                validity_days: None,
                number_prefix: 'Z',
                serial_prefix: "ASP",
            },
            Self::NaturalisationCertificate => DocumentProfile {
                code: "NATURALISATION_CERT",
                title: "Certificate of Naturalisation",
                mrz: None,
                page: PageGeometry::A4,
                required_fields: NATURALISATION_FIELDS,
                features: CERTIFICATE,
                checks: IDENTITY_ONLY,
                validity_days: None,
                number_prefix: 'N',
                serial_prefix: "NAT",
            },
        }
    }

    /// Short code of this type (see [`DocumentProfile::code`]).
    pub fn code(&self) -> &'static str {
        self.profile().code
    }

    /// Inverse of [`DocumentType::code`].
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SecurityFeature;
    use crate::types::PersonalFields;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique_and_round_trip() {
        let codes: HashSet<_> = DocumentType::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes.len(), DocumentType::ALL.len());
        for t in DocumentType::ALL {
            assert_eq!(DocumentType::from_code(t.code()), Some(t));
        }
    }

    #[test]
    fn number_prefixes_identify_the_type() {
        let prefixes: HashSet<char> = DocumentType::ALL.iter().map(|t| t.profile().number_prefix).collect();
        assert_eq!(prefixes.len(), DocumentType::ALL.len());
    }

    #[test]
    fn mrz_documents_enable_the_mrz_feature() {
        for t in DocumentType::ALL {
            let profile = t.profile();
            assert_eq!(
                profile.mrz.is_some(),
                profile.features.is_enabled(SecurityFeature::Mrz),
                "{t} MRZ config and feature flag disagree"
            );
            if let Some(spec) = profile.mrz {
                assert_eq!(spec.document_code.len(), 2);
            }
        }
    }

    #[test]
    fn every_feature_is_used_somewhere() {
        for feature in SecurityFeature::ALL {
            assert!(
                DocumentType::ALL
                    .iter()
                    .any(|t| t.profile().features.is_enabled(feature)),
                "{feature} is never enabled"
            );
        }
    }

    #[test]
    fn missing_fields_reports_all_at_once() {
        let req = DocumentRequest::new(DocumentType::GeneralWorkVisa, PersonalFields::default());
        let missing = DocumentType::GeneralWorkVisa.profile().missing_fields(&req);
        assert_eq!(
            missing,
            vec![
                "surname",
                "givenNames",
                "dateOfBirth",
                "nationality",
                "sex",
                "employer",
                "validFrom",
                "validUntil"
            ]
        );
    }

    #[test]
    fn line_geometry() {
        assert_eq!(MrzFormat::Td1.line_length() * MrzFormat::Td1.line_count(), 90);
        assert_eq!(MrzFormat::Td2.line_length(), 36);
        assert_eq!(MrzFormat::Td3.line_length(), 44);
    }
}
