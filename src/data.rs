//! Run data seeding
//!
//! Flat value bags filled into the portal's forms during a run. Values are
//! generated once at startup and read-only afterwards; the portal owns any
//! relationship between them.

use rand::Rng;
use serde::{Deserialize, Serialize};

const PORTAL_TIME_ZONE: &str = "Alaska Standard Time (GMT -09:00)";

/// Which data set a run is seeded with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum DataProfile {
    /// Fixed names matching the portal's seeded records
    Smoke,
    /// Random names so repeated runs do not collide
    Regression,
}

/// Provider account submitted through the user settings screen.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub email: String,
    pub gender: String,
}

impl ProviderProfile {
    /// Name as the portal renders it in search results and dropdowns.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Patient record submitted through the registration screen.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatientProfile {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub mobile: String,
    pub email: String,
}

impl PatientProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Appointment form values, referencing provider and patient by the
/// display name the portal shows for them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub patient_name: String,
    pub appointment_type: String,
    pub reason_for_visit: String,
    pub time_zone: String,
    pub visit_type: String,
    pub provider_name: String,
}

/// Bookable window configured on the availability screen.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub provider_name: String,
    pub time_zone: String,
    pub booking_window: String,
    pub booking_window_unit: String,
    pub set_to_weekdays: bool,
    pub start_time: String,
    pub end_time: String,
}

/// Everything one run needs, seeded before the browser launches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedData {
    pub provider: ProviderProfile,
    pub patient: PatientProfile,
    pub availability: AvailabilityRule,
    pub appointment: AppointmentRequest,
}

impl SeedData {
    pub fn generate(profile: DataProfile) -> Self {
        match profile {
            DataProfile::Smoke => Self::smoke(),
            DataProfile::Regression => Self::random(&mut rand::thread_rng()),
        }
    }

    /// Fixed data set. Reuses the same provider name across runs, so the
    /// portal may reject the duplicate; the regression profile avoids this.
    pub fn smoke() -> Self {
        let provider = ProviderProfile {
            first_name: "Leena".to_string(),
            last_name: "Brown".to_string(),
            role: "Provider".to_string(),
            email: "leenabrwn@yopmail.com".to_string(),
            gender: "Male".to_string(),
        };
        let patient = PatientProfile {
            first_name: "pavan".to_string(),
            last_name: "Ingale".to_string(),
            date_of_birth: "09-11-1999".to_string(),
            gender: "Male".to_string(),
            mobile: "9876544400".to_string(),
            email: "Pavaningale@yopmail.com".to_string(),
        };
        let availability = availability_for(&provider);
        let appointment = appointment_for(&patient, &provider);
        Self {
            provider,
            patient,
            availability,
            appointment,
        }
    }

    /// Random data set. Names are unique per run and every later form
    /// references the provider created earlier in the same run.
    pub fn random(rng: &mut impl Rng) -> Self {
        let provider = ProviderProfile {
            first_name: random_lowercase(rng, 6),
            last_name: random_lowercase(rng, 6),
            role: "Provider".to_string(),
            email: format!("{}@yopmail.com", random_lowercase(rng, 8)),
            gender: "Male".to_string(),
        };
        let patient = PatientProfile {
            first_name: random_lowercase(rng, 6),
            last_name: random_lowercase(rng, 6),
            date_of_birth: "09-11-1999".to_string(),
            gender: "Male".to_string(),
            mobile: "9876544400".to_string(),
            email: format!("{}@yopmail.com", random_lowercase(rng, 8)),
        };
        let availability = availability_for(&provider);
        let appointment = appointment_for(&patient, &provider);
        Self {
            provider,
            patient,
            availability,
            appointment,
        }
    }
}

fn availability_for(provider: &ProviderProfile) -> AvailabilityRule {
    AvailabilityRule {
        provider_name: provider.display_name(),
        time_zone: PORTAL_TIME_ZONE.to_string(),
        booking_window: "1".to_string(),
        booking_window_unit: "week".to_string(),
        set_to_weekdays: true,
        start_time: "09:00".to_string(),
        end_time: "17:00".to_string(),
    }
}

fn appointment_for(patient: &PatientProfile, provider: &ProviderProfile) -> AppointmentRequest {
    AppointmentRequest {
        patient_name: patient.display_name(),
        appointment_type: "New Patient Visit".to_string(),
        reason_for_visit: "Fever".to_string(),
        time_zone: PORTAL_TIME_ZONE.to_string(),
        visit_type: "Telehealth".to_string(),
        provider_name: provider.display_name(),
    }
}

fn random_lowercase(rng: &mut impl Rng, length: usize) -> String {
    (0..length).map(|_| rng.gen_range('a'..='z')).collect()
}
