use super::super::*;

impl Layer {
    // === Stats Handler Methods ===

    pub(in crate::layer) fn handle_stats(&self, chat: ChatId) -> Vec<Notification> {
        let standings = self.leaderboard.snapshot();
        if standings.is_empty() {
            return vec![Notification::text(chat, messages::STATS_EMPTY)];
        }

        let mut text = String::from(messages::STATS_HEADER);
        for Standing { user, stat, rank } in standings {
            text.push_str(&messages::standing(
                rank,
                &self.handle(user),
                stat.wins,
                stat.losses,
            ));
        }
        vec![Notification::text(chat, text)]
    }
}
