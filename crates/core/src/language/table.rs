use super::LanguageEntry;

const fn entry(
    name: &'static str,
    code: &'static str,
    aliases: &'static [&'static str],
) -> LanguageEntry {
    LanguageEntry {
        name,
        code,
        aliases,
    }
}

// Aliases are stored case-folded. None of them may equal another row's code.
pub(super) static LANGUAGES: &[LanguageEntry] = &[
    entry("english", "en", &["anglais", "inglés", "englisch", "inglese"]),
    entry("spanish", "es", &["español", "espanol", "castellano", "castilian", "espagnol"]),
    entry("french", "fr", &["français", "francais", "französisch", "francés"]),
    entry("german", "de", &["deutsch", "allemand", "alemán", "tedesco"]),
    entry("italian", "it", &["italiano", "italien"]),
    entry("portuguese", "pt", &["português", "portugues", "brazilian portuguese", "pt-br"]),
    entry("dutch", "nl", &["nederlands", "flemish", "vlaams"]),
    entry("russian", "ru", &["русский", "russkiy"]),
    entry("chinese", "zh", &["中文", "mandarin", "simplified chinese", "zh-cn", "zh-hans", "putonghua"]),
    entry("japanese", "ja", &["日本語", "nihongo"]),
    entry("korean", "ko", &["한국어", "hangugeo"]),
    entry("arabic", "ar", &["العربية", "arabi"]),
    entry("hindi", "hi", &["हिन्दी", "हिंदी"]),
    entry("bengali", "bn", &["বাংলা", "bangla"]),
    entry("urdu", "ur", &["اردو"]),
    entry("persian", "fa", &["farsi", "فارسی"]),
    entry("turkish", "tr", &["türkçe", "turkce"]),
    entry("polish", "pl", &["polski"]),
    entry("ukrainian", "uk", &["українська", "ukrainska"]),
    entry("czech", "cs", &["čeština", "cestina"]),
    entry("slovak", "sk", &["slovenčina", "slovencina"]),
    entry("hungarian", "hu", &["magyar"]),
    entry("romanian", "ro", &["română", "romana", "moldovan"]),
    entry("bulgarian", "bg", &["български", "balgarski"]),
    entry("greek", "el", &["ελληνικά", "ellinika"]),
    entry("swedish", "sv", &["svenska"]),
    entry("danish", "da", &["dansk"]),
    entry("norwegian", "no", &["norsk", "bokmål", "bokmal", "nb"]),
    entry("finnish", "fi", &["suomi"]),
    entry("estonian", "et", &["eesti"]),
    entry("latvian", "lv", &["latviešu", "latviesu"]),
    entry("lithuanian", "lt", &["lietuvių", "lietuviu"]),
    entry("slovenian", "sl", &["slovene", "slovenščina"]),
    entry("croatian", "hr", &["hrvatski"]),
    entry("serbian", "sr", &["српски", "srpski"]),
    entry("hebrew", "he", &["עברית", "ivrit", "iw"]),
    entry("thai", "th", &["ไทย"]),
    entry("vietnamese", "vi", &["tiếng việt", "tieng viet"]),
    entry("indonesian", "id", &["bahasa indonesia"]),
    entry("malay", "ms", &["bahasa melayu", "melayu"]),
    entry("tagalog", "tl", &["filipino", "pilipino"]),
    entry("swahili", "sw", &["kiswahili"]),
    entry("amharic", "am", &["አማርኛ", "amarigna"]),
    entry("yoruba", "yo", &["èdè yorùbá"]),
    entry("igbo", "ig", &["asụsụ igbo"]),
    entry("hausa", "ha", &["harshen hausa"]),
    entry("zulu", "zu", &["isizulu"]),
    entry("xhosa", "xh", &["isixhosa"]),
    entry("afrikaans", "af", &[]),
    entry("somali", "so", &["af-soomaali", "soomaali"]),
    entry("lingala", "ln", &["lingála"]),
    entry("catalan", "ca", &["català", "valencian"]),
    entry("icelandic", "is", &["íslenska", "islenska"]),
    entry("irish", "ga", &["gaeilge"]),
    entry("welsh", "cy", &["cymraeg"]),
    entry("tamil", "ta", &["தமிழ்"]),
    entry("telugu", "te", &["తెలుగు"]),
    entry("punjabi", "pa", &["ਪੰਜਾਬੀ", "panjabi"]),
];
