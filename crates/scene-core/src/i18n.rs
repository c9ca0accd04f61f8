use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    #[default]
    Ru,
    En,
}

/// Translate a key. Unknown keys map to "?".
#[rustfmt::skip]
pub fn t(lang: Lang, key: &str) -> &'static str {
    let ru = lang == Lang::Ru;
    match key {
        // ── Generation ──────────────────────────────────────
        "gen.failed" => if ru { "Извините, не удалось создать объект. Попробуйте ещё раз." } else { "Sorry, the object could not be generated. Please try again." },
        "gen.invalid" => if ru { "Извините, не получилось понять запрос и построить объект." } else { "Sorry, I could not understand that well enough to build it." },
        "gen.created" => if ru { "Объект создан." } else { "Object created." },
        "gen.revised" => if ru { "Объект обновлён." } else { "Object updated." },
        "gen.unchanged" => if ru { "Изменений нет." } else { "Nothing changed." },

        // ── Scoring ─────────────────────────────────────────
        "score.view_missing" => if ru { "Недостаточно данных для сравнения этого вида." } else { "Not enough data to compare this view." },
        "score.view_failed" => if ru { "Не удалось сравнить этот вид." } else { "This view could not be compared." },

        // ── Placement ───────────────────────────────────────
        "place.hint" => if ru { "Кликните по клетке, чтобы поставить объект" } else { "Click a cell to place the object" },
        "place.out_of_bounds" => if ru { "За пределами сетки" } else { "Outside the grid" },
        "place.rotate_hint" => if ru { "Нажмите R, чтобы повернуть на 90°" } else { "Press R to rotate by 90°" },

        _ => "?",
    }
}
