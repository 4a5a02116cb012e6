//! Static class-label table.
//!
//! Maps the 80 COCO class ids to short display strings in two locales.
//! The table is compiled in; lookups never allocate and never panic.

use std::str::FromStr;

/// Number of classes the detector can report.
pub const CLASS_COUNT: usize = 80;

/// Shown when a class id falls outside the table.
const UNKNOWN_LABEL: &str = "?";

/// Display locale for class labels and idle text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Ja,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "ja" => Ok(Locale::Ja),
            other => Err(format!("unsupported locale '{}'", other)),
        }
    }
}

/// Resolve the display label for a class id.
pub fn resolve(class_id: u16, locale: Locale) -> &'static str {
    match LABELS.get(class_id as usize) {
        Some((en, ja)) => match locale {
            Locale::En => en,
            Locale::Ja => ja,
        },
        None => UNKNOWN_LABEL,
    }
}

/// Text shown in the detection slots when a cycle produced no detections.
pub fn idle_text(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "No objects",
        Locale::Ja => "検出なし",
    }
}

/// (english, japanese) per COCO class id, 0..=79.
static LABELS: [(&str, &str); CLASS_COUNT] = [
    ("Person", "人"),
    ("Bicycle", "自転車"),
    ("Car", "車"),
    ("Bike", "バイク"),
    ("Plane", "飛行機"),
    ("Bus", "バス"),
    ("Train", "電車"),
    ("Truck", "トラック"),
    ("Boat", "ボート"),
    ("Light", "信号"),
    ("Hydrant", "消火栓"),
    ("Stop", "停止標識"),
    ("Meter", "駐車場"),
    ("Bench", "ベンチ"),
    ("Bird", "鳥"),
    ("Cat", "猫"),
    ("Dog", "犬"),
    ("Horse", "馬"),
    ("Sheep", "羊"),
    ("Cow", "牛"),
    ("Elephant", "象"),
    ("Bear", "熊"),
    ("Zebra", "シマウマ"),
    ("Giraffe", "キリン"),
    ("Backpack", "リュック"),
    ("Umbrella", "傘"),
    ("Handbag", "ハンドバッグ"),
    ("Tie", "ネクタイ"),
    ("Suitcase", "スーツケース"),
    ("Frisbee", "フリスビー"),
    ("Skis", "スキー"),
    ("Snowboard", "スノボ"),
    ("Ball", "ボール"),
    ("Kite", "凧"),
    ("Bat", "バット"),
    ("Glove", "グローブ"),
    ("Skateboard", "スケボ"),
    ("Surfboard", "サーフボード"),
    ("Racket", "ラケット"),
    ("Bottle", "ボトル"),
    ("Glass", "ワイングラス"),
    ("Cup", "カップ"),
    ("Fork", "フォーク"),
    ("Knife", "ナイフ"),
    ("Spoon", "スプーン"),
    ("Bowl", "ボウル"),
    ("Banana", "バナナ"),
    ("Apple", "りんご"),
    ("Sandwich", "サンドイッチ"),
    ("Orange", "オレンジ"),
    ("Broccoli", "ブロッコリー"),
    ("Carrot", "にんじん"),
    ("Hot Dog", "ホットドッグ"),
    ("Pizza", "ピザ"),
    ("Donut", "ドーナツ"),
    ("Cake", "ケーキ"),
    ("Chair", "椅子"),
    ("Couch", "ソファ"),
    ("Plant", "植物"),
    ("Bed", "ベッド"),
    ("Table", "テーブル"),
    ("Toilet", "トイレ"),
    ("TV", "テレビ"),
    ("Laptop", "ノートPC"),
    ("Mouse", "マウス"),
    ("Remote", "リモコン"),
    ("Keyboard", "キーボード"),
    ("Phone", "スマホ"),
    ("Microwave", "電子レンジ"),
    ("Oven", "オーブン"),
    ("Toaster", "トースター"),
    ("Sink", "シンク"),
    ("Fridge", "冷蔵庫"),
    ("Book", "本"),
    ("Clock", "時計"),
    ("Vase", "花瓶"),
    ("Scissors", "ハサミ"),
    ("Teddy", "テディベア"),
    ("Dryer", "ドライヤー"),
    ("Toothbrush", "歯ブラシ"),
];
