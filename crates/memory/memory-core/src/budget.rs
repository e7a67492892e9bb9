//! Character-budget rules. Both keep the newest turns and drop from the oldest end.

use prompt::ChatMessage;

/// Sum of content lengths, in characters.
pub fn total_content_len(turns: &[ChatMessage]) -> usize {
    turns.iter().map(ChatMessage::content_len).sum()
}

/// Evicts turns from the front, one at a time, until the total fits in `max_content_length`.
/// Returns the number of evicted turns.
pub fn evict_oldest(turns: &mut Vec<ChatMessage>, max_content_length: usize) -> usize {
    let mut total = total_content_len(turns);
    let mut evicted = 0;
    while total > max_content_length && evicted < turns.len() {
        total -= turns[evicted].content_len();
        evicted += 1;
    }
    turns.drain(..evicted);
    evicted
}

/// Longest suffix selected greedily from the newest turn backward that fits in
/// `max_content_length`; stops at the first turn that would exceed it. Oldest-first order.
pub fn newest_within(turns: &[ChatMessage], max_content_length: usize) -> Vec<ChatMessage> {
    let mut total = 0;
    let mut start = turns.len();
    for (i, turn) in turns.iter().enumerate().rev() {
        let len = turn.content_len();
        if total + len > max_content_length {
            break;
        }
        total += len;
        start = i;
    }
    turns[start..].to_vec()
}
