#[cfg(test)]
mod tests {
    use crate::export::{poll_results, to_csv, to_json};
    use crate::models::{Choice, DesignOptions, Permission, Poll, PollResults, SavedPoll};
    use crate::poll_state::{PollAction, PollState, ViewMode};
    use crate::validation::validate_poll;
    use time::OffsetDateTime;

    fn choice(id: &str, text: &str, votes: u32) -> Choice {
        Choice {
            id: id.into(),
            text: text.into(),
            votes,
        }
    }

    fn poll(choices: Vec<Choice>) -> Poll {
        Poll::new("Best color?", choices, DesignOptions::default())
    }

    fn voting_state(choices: Vec<Choice>) -> PollState {
        let mut state = PollState::default();
        state.apply(PollAction::CreatePoll(poll(choices)));
        state
    }

    #[test]
    fn test_vote_increments_exactly_one_choice() {
        let mut state = voting_state(vec![choice("a", "A", 0), choice("b", "B", 0)]);
        state.apply(PollAction::Vote { choice_id: "a".into() });

        let poll = state.current_poll.as_ref().unwrap();
        assert_eq!(poll.choices[0].votes, 1);
        assert_eq!(poll.choices[1].votes, 0);
        assert!(state.has_voted);
        assert_eq!(state.view_mode, ViewMode::Results);
    }

    #[test]
    fn test_vote_without_current_poll_is_noop() {
        let mut state = PollState::default();
        state.apply(PollAction::Vote { choice_id: "a".into() });

        assert!(state.current_poll.is_none());
        assert!(!state.has_voted);
        assert_eq!(state.view_mode, ViewMode::Landing);
    }

    #[test]
    fn test_vote_on_unknown_choice_changes_no_counter() {
        let mut state = voting_state(vec![choice("a", "A", 2), choice("b", "B", 3)]);
        state.apply(PollAction::Vote { choice_id: "zzz".into() });

        let poll = state.current_poll.as_ref().unwrap();
        assert_eq!(poll.choices[0].votes, 2);
        assert_eq!(poll.choices[1].votes, 3);
        assert!(state.has_voted);
    }

    #[test]
    fn test_repeat_vote_is_not_rejected_by_the_reducer() {
        // Only callers gate on has_voted; a replayed dispatch counts again.
        let mut state = voting_state(vec![choice("a", "A", 0), choice("b", "B", 0)]);
        state.apply(PollAction::Vote { choice_id: "a".into() });
        state.apply(PollAction::Vote { choice_id: "a".into() });

        assert_eq!(state.current_poll.as_ref().unwrap().choices[0].votes, 2);
    }

    #[test]
    fn test_reset_poll_zeroes_every_count() {
        let mut state = voting_state(vec![choice("a", "A", 3), choice("b", "B", 5)]);
        state.apply(PollAction::SetHasVoted(true));
        state.apply(PollAction::ResetPoll);

        let poll = state.current_poll.as_ref().unwrap();
        assert_eq!(poll.choices[0].votes, 0);
        assert_eq!(poll.choices[1].votes, 0);
        assert!(!state.has_voted);
        assert_eq!(state.view_mode, ViewMode::Vote);
    }

    #[test]
    fn test_reset_voting_state_keeps_counts() {
        let mut state = voting_state(vec![choice("a", "A", 3), choice("b", "B", 5)]);
        state.apply(PollAction::Vote { choice_id: "a".into() });
        state.apply(PollAction::ResetVotingState);

        let poll = state.current_poll.as_ref().unwrap();
        assert_eq!(poll.choices[0].votes, 4);
        assert_eq!(poll.choices[1].votes, 5);
        assert!(!state.has_voted);
        assert_eq!(state.view_mode, ViewMode::Vote);
    }

    #[test]
    fn test_create_poll_enters_vote_mode() {
        let mut state = voting_state(vec![choice("a", "A", 0), choice("b", "B", 0)]);
        state.apply(PollAction::Vote { choice_id: "a".into() });
        state.apply(PollAction::CreatePoll(poll(vec![choice("x", "X", 0), choice("y", "Y", 0)])));

        assert_eq!(state.view_mode, ViewMode::Vote);
        assert!(!state.has_voted);
    }

    #[test]
    fn test_create_poll_preserves_shared_poll_flow() {
        // A live update of a shared poll must not pull a visitor who has
        // already voted back to the ballot screen.
        let mut state = PollState::default();
        state.apply(PollAction::SetViewMode(ViewMode::SharedPoll));
        state.apply(PollAction::CreatePoll(poll(vec![choice("a", "A", 0), choice("b", "B", 0)])));
        state.apply(PollAction::SetHasVoted(true));

        let refreshed = poll(vec![choice("a", "A", 7), choice("b", "B", 4)]);
        state.apply(PollAction::CreatePoll(refreshed.clone()));

        assert_eq!(state.view_mode, ViewMode::SharedPoll);
        assert!(state.has_voted);
        assert_eq!(state.current_poll, Some(refreshed));
    }

    #[test]
    fn test_validation_rejects_empty_question() {
        let errors = validate_poll("", &["a", "b"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "question");
    }

    #[test]
    fn test_validation_rejects_short_question() {
        let errors = validate_poll("Hi", &["a", "b"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "question");
    }

    #[test]
    fn test_validation_rejects_duplicates_case_insensitively() {
        let errors = validate_poll("Pick one", &["a", "a"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "choices");

        let errors = validate_poll("Pick one", &["Tea ", "tea"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "choices");
    }

    #[test]
    fn test_validation_rejects_too_few_choices() {
        let errors = validate_poll("Pick one", &["a"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "choices");
    }

    #[test]
    fn test_validation_rejects_too_many_choices() {
        let choices: Vec<String> = (0..11).map(|i| format!("choice {i}")).collect();
        let errors = validate_poll("Pick one", &choices);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "choices");
    }

    #[test]
    fn test_validation_rejects_blank_choice() {
        let errors = validate_poll("Pick one", &["a", "  "]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "choices");
    }

    #[test]
    fn test_validation_collects_both_fields() {
        let errors = validate_poll("", &["a"]);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_validation_accepts_a_well_formed_poll() {
        assert!(validate_poll("Pick one", &["a", "b", "c"]).is_empty());
    }

    #[test]
    fn test_csv_export_scenario() {
        let mut state = voting_state(vec![choice("r", "Red", 0), choice("b", "Blue", 0)]);
        state.apply(PollAction::Vote { choice_id: "r".into() });

        let csv = to_csv(state.current_poll.as_ref().unwrap());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Choice,Votes,Percentage");
        assert_eq!(lines[1], "Red,1,100%");
        assert_eq!(lines[2], "Blue,0,0%");
        assert_eq!(lines[3], "Total,1,100%");
    }

    #[test]
    fn test_csv_export_with_no_votes() {
        let csv = to_csv(&poll(vec![choice("a", "A", 0), choice("b", "B", 0)]));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "A,0,0%");
        assert_eq!(lines[2], "B,0,0%");
        assert_eq!(lines[3], "Total,0,100%");
    }

    #[test]
    fn test_json_export_round_trip() {
        let poll = poll(vec![choice("a", "A", 1), choice("b", "B", 2), choice("c", "C", 1)]);
        let json = to_json(&poll).unwrap();
        let parsed: PollResults = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.question, poll.question);
        assert_eq!(parsed.total_votes, 4);
        for (result, choice) in parsed.results.iter().zip(&poll.choices) {
            let expected = (f64::from(choice.votes) / 4.0 * 100.0).round() as u32;
            assert_eq!(result.percentage, expected);
        }
        assert!(!parsed.exported_at.is_empty());
    }

    #[test]
    fn test_percentages_are_rounded_per_choice() {
        // 1/3 each rounds to 33; the sum drifting below 100 is accepted.
        let results = poll_results(&poll(vec![
            choice("a", "A", 1),
            choice("b", "B", 1),
            choice("c", "C", 1),
        ]));
        assert!(results.results.iter().all(|r| r.percentage == 33));
    }

    #[test]
    fn test_default_title_truncates_long_questions() {
        let long = "Which of these options do you prefer the most overall?";
        let title = SavedPoll::default_title(long);
        assert!(title.starts_with("Poll: "));
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), "Poll: ".chars().count() + 30 + 3);

        assert_eq!(SavedPoll::default_title("Best color?"), "Poll: Best color?");
    }

    #[test]
    fn test_saved_poll_round_trip_carries_sharing_metadata() {
        let mut source = poll(vec![choice("a", "A", 3), choice("b", "B", 5)]);
        source.user_id = Some("owner-1".into());
        source.shared_with = vec!["friend@example.com".into()];
        source.permissions.insert("friend@example.com".into(), Permission::View);
        source.design.background_image = Some("https://img.example/bg.png".into());

        let saved = SavedPoll::from_poll(&source, None, None, None, OffsetDateTime::now_utc());
        assert_eq!(saved.total_votes, 8);

        let rebuilt = saved.to_poll();
        assert_eq!(rebuilt.user_id, source.user_id);
        assert_eq!(rebuilt.shared_with, source.shared_with);
        assert_eq!(rebuilt.permissions, source.permissions);
        assert_eq!(rebuilt.design.background_image, source.design.background_image);
    }
}
