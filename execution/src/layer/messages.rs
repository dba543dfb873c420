//! User-facing texts.

use duelbot_types::GameKind;

pub const ACCEPT_LABEL: &str = "Принять";
pub const REJECT_LABEL: &str = "Отказаться";
pub const SHOOT_LABEL: &str = "Выстрелить";
pub const PULL_LABEL: &str = "Нажать на курок";

pub const CHALLENGE_EXPIRED: &str = "Этот вызов уже неактуален.";
pub const SESSION_FINISHED: &str = "Эта игра уже завершена.";
pub const NOT_ENOUGH_PLAYERS: &str = "Для русской рулетки нужно минимум двое участников.";
pub const DUPLICATE_PARTICIPANT: &str = "Каждого участника можно указать только один раз.";
pub const STATS_EMPTY: &str = "Статистика пуста. Никто еще не участвовал в дуэлях.";
pub const STATS_HEADER: &str = "Турнирная таблица дуэлей:\n";

pub fn user_not_found(handle: &str) -> String {
    format!("Не могу найти пользователя @{handle}.")
}

pub fn bot_challenge(kind: GameKind) -> String {
    format!("Вы не можете вызвать бота на {}!", kind.noun())
}

pub fn self_challenge(kind: GameKind) -> String {
    format!("Вы не можете вызвать на {} самого себя!", kind.noun())
}

pub fn challenge(kind: GameKind, initiator: &str, target: &str) -> String {
    match kind {
        GameKind::Duel => {
            format!("{initiator} вызывает @{target} на дуэль! @{target}, вы принимаете дуэль?")
        }
        GameKind::Roulette => format!(
            "{initiator} вызывает @{target} на русскую рулетку! @{target}, вы принимаете вызов?"
        ),
    }
}

pub fn not_your_turn(actor: &str) -> String {
    format!("@{actor}, сейчас не ваша очередь!")
}

pub fn not_challenged(actor: &str) -> String {
    format!("@{actor}, этот вызов адресован не вам.")
}

pub fn rejected(kind: GameKind, actor: &str) -> String {
    format!("@{actor} отклонил {}.", kind.noun())
}

pub fn duel_started(first: &str, second: &str) -> String {
    format!("Дуэль началась между @{first} и @{second}!")
}

pub fn roulette_started(participants: &[String]) -> String {
    let names: Vec<String> = participants.iter().map(|h| format!("@{h}")).collect();
    format!("Русская рулетка началась! Участники: {}.", names.join(", "))
}

pub fn shoot_turn(shooter: &str) -> String {
    format!("@{shooter}, ваша очередь стрелять!")
}

pub fn missed(shooter: &str) -> String {
    format!("@{shooter} промахнулся!")
}

pub fn duel_won(winner: &str) -> String {
    format!("@{winner} победил в дуэли!")
}

pub fn pull_turn(player: &str) -> String {
    format!("@{player}, ваша очередь крутить барабан!")
}

pub fn click(player: &str) -> String {
    format!("Щёлк! @{player} остаётся в игре.")
}

pub fn bang(player: &str) -> String {
    format!("Бах! @{player} выбывает.")
}

pub fn roulette_won(winner: &str) -> String {
    format!("@{winner} побеждает в русской рулетке!")
}

pub const ROULETTE_NO_SURVIVORS: &str = "В живых никого не осталось.";

pub fn standing(rank: u32, handle: &str, wins: u32, losses: u32) -> String {
    format!("{rank}. @{handle} - Побед: {wins}, Поражений: {losses}\n")
}
