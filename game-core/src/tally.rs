use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub voter: String,
    pub voted_for: String,
}

impl Vote {
    pub fn new(voter: impl Into<String>, voted_for: impl Into<String>) -> Self {
        Self {
            voter: voter.into(),
            voted_for: voted_for.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TallyEntry {
    pub name: String,
    pub votes: usize,
}

/// Counts votes per player, most votes first.
///
/// Every player starts at zero so unvoted players still appear. Ties keep roster
/// order. Votes for names outside the roster are not counted.
pub fn tally_votes(player_names: &[String], votes: &[Vote]) -> Vec<TallyEntry> {
    let mut entries: Vec<TallyEntry> = player_names
        .iter()
        .map(|name| TallyEntry {
            name: name.clone(),
            votes: 0,
        })
        .collect();

    for vote in votes {
        if let Some(entry) = entries.iter_mut().find(|e| e.name == vote.voted_for) {
            entry.votes += 1;
        }
    }

    // sort_by is stable
    entries.sort_by(|a, b| b.votes.cmp(&a.votes));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn three_player_scenario() {
        let roster = names(&["A", "B", "C"]);
        let votes = vec![Vote::new("A", "B"), Vote::new("B", "C"), Vote::new("C", "B")];

        let tally = tally_votes(&roster, &votes);

        assert_eq!(
            tally,
            vec![
                TallyEntry { name: "B".into(), votes: 2 },
                TallyEntry { name: "C".into(), votes: 1 },
                TallyEntry { name: "A".into(), votes: 0 },
            ]
        );
    }

    #[test]
    fn ties_keep_roster_order_and_zeroes_are_listed() {
        let roster = names(&["Ann", "Bo", "Cy", "Di"]);
        let votes = vec![
            Vote::new("Ann", "Di"),
            Vote::new("Bo", "Cy"),
            Vote::new("Cy", "Di"),
            Vote::new("Di", "Cy"),
        ];

        let tally = tally_votes(&roster, &votes);
        let order: Vec<&str> = tally.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(order, vec!["Cy", "Di", "Ann", "Bo"]);
        assert_eq!(tally.iter().map(|e| e.votes).sum::<usize>(), votes.len());
    }

    #[test]
    fn empty_votes_all_zero() {
        let roster = names(&["A", "B", "C"]);
        let tally = tally_votes(&roster, &[]);
        assert_eq!(tally.len(), 3);
        assert!(tally.iter().all(|e| e.votes == 0));
        assert_eq!(tally[0].name, "A");
    }

    #[test]
    fn unknown_candidate_does_not_create_bucket() {
        let roster = names(&["A", "B", "C"]);
        let tally = tally_votes(&roster, &[Vote::new("A", "Zed")]);
        assert_eq!(tally.len(), 3);
        assert!(tally.iter().all(|e| e.name != "Zed"));
    }
}
