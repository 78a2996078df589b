//! Brand colours, publication constants and the copy of the inaugural issue.

/// The TokiStorage brand colours.
pub mod palette {
    use crate::pdf::Color;

    pub const TOKI_BLUE: Color = Color::rgb(37, 99, 235);
    pub const TOKI_BLUE_PALE: Color = Color::rgb(239, 246, 255);
    pub const DARK: Color = Color::rgb(30, 41, 59);
    pub const SECONDARY: Color = Color::rgb(71, 85, 105);
    pub const MUTED: Color = Color::rgb(148, 163, 184);
    pub const BORDER: Color = Color::rgb(226, 232, 240);
    pub const BG_LIGHT: Color = Color::rgb(248, 250, 252);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const EMERALD: Color = Color::rgb(22, 163, 74);
}

pub const PUBLICATION_NAME: &str = "TokiStorage Newsletter";
pub const PUBLICATION_NAME_JA: &str = "トキストレージ ニュースレター";
pub const PUBLISHER: &str = "TokiStorage（佐藤卓也）";
pub const PUBLISHER_PERSON: &str = "佐藤卓也";
pub const PUBLISHER_TRADE_NAME: &str = "TokiStorage（トキストレージ）";
pub const PUBLISHER_ADDRESS: &str = "〒279-0014 千葉県浦安市明海2-11-13";
pub const PUBLISHER_URL: &str = "https://tokistorage.github.io/lp/";
pub const PUBLISHER_EMAIL: &str = "tokistorage1000@gmail.com";
pub const LEGAL_BASIS: &str = "国立国会図書館法 第25条・第25条の4";
pub const FORMAT_DESCRIPTION: &str = "PDF（電子書籍等・オンライン資料）";

pub const NUMBERING_EXPLANATION: &str = "本ニュースレターは、1000年以上の継続発行を想定した採番体系を採用しています。\n\
・巻（Volume）＝ 創刊年（2026年）からの年数（2026年＝第1巻、2027年＝第2巻…）\n\
・号（Number）＝ 同一年内の連番（第1号、第2号…）\n\
・通巻（Serial）＝ 全号を通じた連番（5桁、最大99,999号＝年50回×2,000年相当）\n\
・ファイル名＝ YYYY-NN形式（例：2026-01, 3026-12）";

pub const DEPOSIT_DECLARATION: &str = "本誌は、国立国会図書館法（第25条の4）に基づき、\
オンライン資料として国立国会図書館に納本されます。\n\n\
This publication is deposited with the National Diet Library \
of Japan under Article 25-4 of the National Diet Library Law.";

pub const DEFAULT_NEXT_ISSUE_PREVIEW: &str =
    "技術デモQRコードの掲載と、佐渡拠点の進捗報告を予定しています。";

pub const TOKIQR_TAGLINE: &str = "あなたが物語になり、世代の対話と重なり、未来が豊かになる";
pub const TOKIQR_COPYRIGHT: &str = "© TokiStorage — tokistorage.github.io/lp/";
pub const SCAN_INSTRUCTION: &str = "スマートフォンでスキャンすると再生できます";

/// Cover copy of an issue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverCopy {
    pub title: &'static str,
    pub tagline: &'static str,
    pub subject: &'static str,
    pub keywords: &'static str,
}

pub const INAUGURAL_COVER: CoverCopy = CoverCopy {
    title: "創刊号",
    tagline: "── 声を、国家の永久保存記録にする ──",
    subject: "存在証明の民主化",
    keywords: "存在証明, QRコード, 国立国会図書館, 逐次刊行物, 三層分散保管",
};

/// One element of a content section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paragraph {
    Body(&'static str),
    Emphasis(&'static str),
    /// A single centred line in the accent colour.
    Flow(&'static str),
    Table(&'static Table),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Table {
    pub column_widths: &'static [f32],
    pub header: &'static [&'static str],
    pub rows: &'static [&'static [&'static str]],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub heading: &'static str,
    pub paragraphs: &'static [Paragraph],
}

pub const STORAGE_LAYERS: Table = Table {
    column_widths: &[30.0, 55.0, 95.0],
    header: &["層", "媒体", "特徴"],
    rows: &[
        &[
            "物理層",
            "石英ガラス／UV耐性ラミネート",
            "電源・サーバー不要。手元に届き、触れられる存在証明",
        ],
        &[
            "国家層",
            "国立国会図書館（法定納本）",
            "国の法制度による制度的永久保存",
        ],
        &[
            "民間層",
            "GitHub（Arctic Code Vault）",
            "世界中に分散されたサーバー＋北極圏アーカイブ",
        ],
    ],
};

pub const INAUGURAL_SECTIONS: &[Section] = &[
    Section {
        heading: "発刊にあたって",
        paragraphs: &[
            Paragraph::Body(
                "このニュースレターは、トキストレージが発行する逐次刊行物です。\
                 国立国会図書館法（第25条・第25条の4）に基づき、電子書籍等として納本されます。",
            ),
            Paragraph::Body(
                "「私が存在した」ことを永久に残す——それは、歴史に名を刻める特権階級だけのものでした。\
                 王侯貴族、偉人、有名人。普通の人の存在は、3世代で忘れ去られます。\
                 あなたの曾祖父母の名前を、言えますか？",
            ),
            Paragraph::Body(
                "トキストレージは「存在証明の民主化」を使命に掲げ、\
                 すべての人の声と存在を国家永久保存にする唯一の無料・デジタル完結の手段を提供します。\
                 本ニュースレターは、その活動記録であり、同時にそれ自体が国立国会図書館に永久保存される\
                 「存在証明」でもあります。",
            ),
        ],
    },
    Section {
        heading: "トキストレージとは",
        paragraphs: &[
            Paragraph::Emphasis("ミッション：記憶の不平等に挑む"),
            Paragraph::Body(
                "トキストレージは、物理・国家・民間の三層分散保管によって、\
                 あなたの存在証明を永続化するサービスです。個人事業として2026年2月に創業しました。",
            ),
            Paragraph::Emphasis("三層分散保管アーキテクチャ"),
            Paragraph::Table(&STORAGE_LAYERS),
            Paragraph::Body(
                "この設計は、データ保全の世界標準「3-2-1ルール」\
                 ——3つのコピー、2種類の媒体、1つはオフサイト——を満たします。\
                 単一障害点がなく、どれかひとつが残れば、存在証明は失われません。",
            ),
        ],
    },
    Section {
        heading: "技術概要：声を国家の永久保存記録にする",
        paragraphs: &[
            Paragraph::Emphasis("パイプライン：声 → QRコード → PDF → 国会図書館"),
            Paragraph::Body(
                "音声は本来、再生機器やサーバーがなければ消えてしまう揮発性の高いメディアです。\
                 トキストレージは、国際特許出願中の独自データ圧縮技術により、\
                 データサイズ制約の多いQRコードの仕様内でより多くの声を記録します。\
                 音声をQRコードに変換し、PDFに埋め込み、ニュースレター（本誌）として\
                 国立国会図書館に納本します。",
            ),
            Paragraph::Flow("[声]  ->  [QRコード]  ->  [PDF]  ->  [国会図書館]"),
            Paragraph::Emphasis("なぜ、この方法しかないのか"),
            Paragraph::Body(
                "国立国会図書館のオンライン資料収集が受け付けるフォーマットは \
                 PDF・EPUB・DAISYの3種のみ。MP3やWAVなどの音声ファイルは\
                 「図書又は逐次刊行物に相当するもの」に該当せず、制度上、納本できません。\n\n\
                 物理メディア（CD/DVD）に焼いて納本する方法はありますが、製造費・郵送費がかかり、\
                 デジタルで完結しません。\n\n\
                 音声→QRコード→PDF→ニュースレター（逐次刊行物）という変換は、\
                 無料・デジタル完結・可逆的（元の音声に復元可能）・制度的に適格\
                 ——この4条件をすべて満たす唯一の方法です。",
            ),
        ],
    },
    Section {
        heading: "このニュースレター自体が存在証明",
        paragraphs: &[
            Paragraph::Body(
                "ここに重要な自己言及があります。\
                 このPDFは、国立国会図書館に納本されます。つまり、今あなたが読んでいるこの文書自体が、\
                 制度的に永久保存される「存在証明」です。",
            ),
            Paragraph::Body(
                "トキストレージのニュースレターは、単なる広報ではありません。\
                 顧客の声（TokiQRコード）を掲載し、それを国家保存に届ける「媒体」であると同時に、\
                 トキストレージという事業そのものの存在証明でもあります。",
            ),
        ],
    },
    Section {
        heading: "今後の予定",
        paragraphs: &[Paragraph::Body(
            "次号以降、以下の内容を予定しています：\n\n\
             ・ご利用者さまの声（許諾をいただいたTokiQRコードの掲載）\n\
             ・技術アップデート（圧縮率の改善、新フォーマット対応等）\n\
             ・QRコードサンプル（スマートフォンで読み取り、再生体験が可能）\n\
             ・分散保管の進捗報告（佐渡・マウイの物理保管拠点の状況）\n\
             ・パートナー・協賛者のご紹介",
        )],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_rows_match_the_header() {
        assert_eq!(
            STORAGE_LAYERS.header.len(),
            STORAGE_LAYERS.column_widths.len()
        );
        for row in STORAGE_LAYERS.rows {
            assert_eq!(row.len(), STORAGE_LAYERS.header.len());
        }
        assert_eq!(STORAGE_LAYERS.column_widths.iter().sum::<f32>(), 180.0);
    }

    #[test]
    fn line_continuations_keep_explicit_breaks() {
        assert_eq!(NUMBERING_EXPLANATION.lines().count(), 5);
        assert!(NUMBERING_EXPLANATION
            .lines()
            .skip(1)
            .all(|line| line.starts_with('・')));
    }
}
