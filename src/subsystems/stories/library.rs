//! Curated story library: the keyword tier and the default pool.
//!
//! The keyword table is an ordered slice, not a map: when a prompt contains
//! several keywords, the one listed first here wins.  Reordering entries
//! changes which theme such prompts get.

use rand::seq::SliceRandom;

/// Keyword → curated stories, in precedence order.
///
/// Matching is plain substring containment, so short keywords also fire
/// inside longer words: `king` matches "looking", `sea` matches "season".
/// Such prompts get that theme's stories.
pub const KEYWORD_STORIES: &[(&str, &[&str])] = &[
    ("mountain", &[
        "High in the misty mountains, an old shepherd heard the peaks singing at dawn. \
         He followed the song to a hidden valley where the mountain spirit asked him to guard \
         its snow leopards, and in return his flock never lost its way in the fog again.",
        "The villagers said no one could climb the black mountain and return. A young girl \
         carried only a lantern and her grandmother's song; when the mountain heard the song \
         it had not heard in a hundred years, it opened a path of stone steps just for her.",
        "Every winter the mountain wore a crown of clouds. When a greedy king tried to steal it, \
         the mountain shrugged, the clouds scattered into rain, and the king's fields flooded \
         while the humble farmers below drank their fill.",
    ]),
    ("river", &[
        "The river spirit borrowed a fisherman's net and returned it filled with silver scales \
         that turned to coins at sunrise. He shared them with the whole village, and the river \
         has run clear and generous ever since.",
        "Two brothers argued over which bank of the river was theirs. The river, tired of their \
         quarrel, changed its course overnight, and the brothers woke on the same side, \
         neighbours at last.",
    ]),
    ("forest", &[
        "Deep in the old forest lived a tree that remembered every traveller's name. Those who \
         greeted it kindly found the path home shortened by an hour; those who broke its \
         branches walked in circles until they apologised.",
        "A woodcutter spared the smallest sapling in the forest. Years later, when storms tore \
         through the valley, that same tree, grown tall, bent over his cottage and took the \
         lightning in his place.",
    ]),
    ("dragon", &[
        "The dragon of the eastern lake did not hoard gold but stories. Each year the children \
         rowed out to tell it a new tale, and each year it paid them with rain for the rice \
         fields.",
    ]),
    ("fox", &[
        "A clever fox borrowed the tiger's shadow to walk through the jungle unchallenged. \
         Every animal bowed, and the tiger, seeing them bow, believed the fox was the true king \
         of the forest.",
        "The fox promised the crow a song more beautiful than any cheese. When the crow opened \
         its beak to listen, the fox caught the cheese and left the song for another day.",
    ]),
    ("tiger", &[
        "A tiger who could not roar learned to listen instead. He heard the hunters' footsteps \
         long before the others and led the whole jungle to safety, and no one ever asked him \
         to roar again.",
    ]),
    ("moon", &[
        "The moon once came down to drink from the village well. A little boy offered her his \
         cup, and in thanks she left a rabbit on her face so he would always have someone \
         watching over him at night.",
    ]),
    ("sea", &[
        "A fisherwoman's daughter sang to the sea every evening. When a storm came, the waves \
         carried her father's boat gently to shore, for the sea had grown fond of the song and \
         wanted to hear it again.",
    ]),
    ("bird", &[
        "A tiny bird carried one drop of water at a time to fight the forest fire. The other \
         animals laughed until the rain god, moved by such stubborn courage, wept a storm that \
         saved them all.",
    ]),
    ("king", &[
        "A king offered half his kingdom to anyone who could fill his hall completely. The \
         youngest daughter lit a single candle, and its light filled every corner, and the king \
         understood that wisdom weighs nothing.",
    ]),
    ("spirit", &[
        "The spirit of the crossroads asked every traveller one question: where are you going? \
         Those who answered truthfully were shown a shortcut; those who lied found the road \
         stretched twice as long.",
    ]),
    ("village", &[
        "Once a year the whole village left one empty seat at the harvest feast. The elders said \
         it was for the stranger who would someday need it, and the year a lost traveller \
         finally sat there, the harvest was the richest anyone could remember.",
    ]),
];

/// Generic folklore openings used when nothing in the table matches.
pub const DEFAULT_STORIES: &[&str] = &[
    "Long ago, when animals could still speak, a wise old owl gathered the creatures of the \
     valley to share a secret: kindness given freely always finds its way home.",
    "In a small village at the edge of the world, the elders told of a lantern that never \
     went out as long as someone in the village was telling a story.",
    "Once upon a time, a traveller carried a bag of seeds from land to land. Wherever a seed \
     fell, a new tale took root, and that is why every place has a story of its own.",
    "The grandmothers say that every star is a story someone forgot to finish, waiting in the \
     sky for a child brave enough to tell the ending.",
    "There was once a storyteller who owned nothing but words, yet every king who met her left \
     richer than he came.",
];

/// Lowercase and trim a prompt for keyword matching.
pub fn normalize(prompt: &str) -> String {
    prompt.trim().to_lowercase()
}

/// First keyword in table order that occurs anywhere in `prompt`.
pub fn match_keyword(prompt: &str) -> Option<(&'static str, &'static [&'static str])> {
    let normalized = normalize(prompt);
    KEYWORD_STORIES
        .iter()
        .find(|(keyword, _)| normalized.contains(keyword))
        .copied()
}

/// Keyword tier: the matched theme plus one of its stories, chosen uniformly.
pub fn keyword_story(prompt: &str) -> Option<(&'static str, &'static str)> {
    let (keyword, stories) = match_keyword(prompt)?;
    let story = *stories.choose(&mut rand::thread_rng())?;
    Some((keyword, story))
}

/// Default tier: one story from [`DEFAULT_STORIES`], chosen uniformly.
pub fn default_story() -> &'static str {
    DEFAULT_STORIES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(DEFAULT_STORIES[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn table_is_well_formed() {
        let mut seen = HashSet::new();
        for (keyword, stories) in KEYWORD_STORIES {
            assert_eq!(*keyword, keyword.to_lowercase(), "keywords are stored lowercase");
            assert!(seen.insert(*keyword), "duplicate keyword {keyword}");
            assert!(!stories.is_empty(), "{keyword} has no stories");
        }
        assert!(!DEFAULT_STORIES.is_empty());
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let (kw, _) = match_keyword("  Tell me about the MOUNTAINS  ").unwrap();
        assert_eq!(kw, "mountain");
    }

    #[test]
    fn table_order_breaks_ties() {
        // "fox" and "tiger" both appear; "fox" is listed first.
        let (kw, _) = match_keyword("the tiger and the fox").unwrap();
        assert_eq!(kw, "fox");
        // "mountain" precedes "river" regardless of prompt order.
        let (kw, _) = match_keyword("a river below a mountain").unwrap();
        assert_eq!(kw, "mountain");
    }

    #[test]
    fn keyword_inside_other_word_matches() {
        let (kw, _) = match_keyword("seashells by the shore").unwrap();
        assert_eq!(kw, "sea");
    }

    #[test]
    fn short_keywords_match_inside_common_words() {
        assert_eq!(match_keyword("I was looking for a tale").unwrap().0, "king");
        assert_eq!(match_keyword("a story for the rainy season").unwrap().0, "sea");
    }

    #[test]
    fn no_match_for_unrelated_or_empty() {
        assert!(match_keyword("").is_none());
        assert!(match_keyword("quantum computing").is_none());
        assert!(match_keyword("山と川の物語").is_none());
    }

    #[test]
    fn keyword_story_comes_from_theme() {
        let (theme, story) = keyword_story("Tell me about the mountain").unwrap();
        assert_eq!(theme, "mountain");
        let (_, stories) = match_keyword("mountain").unwrap();
        assert!(stories.contains(&story));
    }

    #[test]
    fn default_story_from_pool() {
        for _ in 0..20 {
            assert!(DEFAULT_STORIES.contains(&default_story()));
        }
    }
}
