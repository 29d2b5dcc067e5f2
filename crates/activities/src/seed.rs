//! Default Mergington High School activity catalog.

use mergington_core::Email;

use crate::activity::Activity;
use crate::error::RegistryError;

struct SeedActivity {
    name: &'static str,
    description: &'static str,
    schedule: &'static str,
    max_participants: u32,
    participants: &'static [&'static str],
}

const CATALOG: &[SeedActivity] = &[
    SeedActivity {
        name: "Chess Club",
        description: "Learn strategies and compete in chess tournaments",
        schedule: "Fridays, 3:30 PM - 5:00 PM",
        max_participants: 12,
        participants: &["michael@mergington.edu", "daniel@mergington.edu"],
    },
    SeedActivity {
        name: "Programming Class",
        description: "Learn programming fundamentals and build software projects",
        schedule: "Tuesdays and Thursdays, 3:30 PM - 4:30 PM",
        max_participants: 20,
        participants: &["emma@mergington.edu", "sophia@mergington.edu"],
    },
    SeedActivity {
        name: "Gym Class",
        description: "Physical education and sports activities",
        schedule: "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM",
        max_participants: 30,
        participants: &["john@mergington.edu", "olivia@mergington.edu"],
    },
    SeedActivity {
        name: "Soccer Team",
        description: "Join the school soccer team and compete in matches",
        schedule: "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
        max_participants: 22,
        participants: &["liam@mergington.edu", "noah@mergington.edu"],
    },
    SeedActivity {
        name: "Basketball Team",
        description: "Practice and play basketball with the school team",
        schedule: "Wednesdays and Fridays, 3:30 PM - 5:00 PM",
        max_participants: 15,
        participants: &["ava@mergington.edu", "mia@mergington.edu"],
    },
    SeedActivity {
        name: "Art Club",
        description: "Explore your creativity through painting and drawing",
        schedule: "Thursdays, 3:30 PM - 5:00 PM",
        max_participants: 15,
        participants: &["amelia@mergington.edu", "harper@mergington.edu"],
    },
    SeedActivity {
        name: "Drama Club",
        description: "Act, direct, and produce plays and performances",
        schedule: "Mondays and Wednesdays, 4:00 PM - 5:30 PM",
        max_participants: 20,
        participants: &["ella@mergington.edu", "scarlett@mergington.edu"],
    },
    SeedActivity {
        name: "Math Club",
        description: "Solve challenging problems and participate in math competitions",
        schedule: "Tuesdays, 3:30 PM - 4:30 PM",
        max_participants: 10,
        participants: &["james@mergington.edu", "benjamin@mergington.edu"],
    },
    SeedActivity {
        name: "Debate Team",
        description: "Develop public speaking and argumentation skills",
        schedule: "Fridays, 4:00 PM - 5:30 PM",
        max_participants: 12,
        participants: &["charlotte@mergington.edu", "henry@mergington.edu"],
    },
];

/// The nine default activities, each with its two seeded participants.
pub fn default_catalog() -> Result<Vec<Activity>, RegistryError> {
    CATALOG
        .iter()
        .map(|seed| {
            let participants = seed
                .participants
                .iter()
                .map(|raw| Email::parse(raw).map_err(|e| RegistryError::InvalidActivity(e.to_string())))
                .collect::<Result<Vec<_>, _>>()?;

            Activity::new(seed.name, seed.description, seed.schedule, seed.max_participants)?
                .with_participants(participants)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn catalog_is_valid() {
        let catalog = default_catalog().unwrap();
        assert_eq!(catalog.len(), 9);

        let names: BTreeSet<&str> = catalog.iter().map(Activity::name).collect();
        assert_eq!(names.len(), 9, "activity names must be unique");

        for activity in &catalog {
            assert_eq!(activity.participant_count(), 2);
            assert!(!activity.is_full());
        }
    }

    #[test]
    fn chess_club_matches_the_school_listing() {
        let catalog = default_catalog().unwrap();
        let chess = catalog.iter().find(|a| a.name() == "Chess Club").unwrap();
        assert_eq!(chess.max_participants(), 12);
        assert_eq!(chess.schedule(), "Fridays, 3:30 PM - 5:00 PM");
        let roster: Vec<&str> = chess.participants().map(Email::as_str).collect();
        assert_eq!(roster, ["daniel@mergington.edu", "michael@mergington.edu"]);
    }
}
