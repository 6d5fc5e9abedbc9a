//! Static name data.
//!
//! Kept separate from the lookup logic so the tables stay easy to audit.

/// Pitch names for notes 0..=127, octave numbering starting at -1.
pub(crate) const PITCH_NAMES: [&str; 128] = [
    "C-1", "C#-1", "D-1", "D#-1", "E-1", "F-1", "F#-1", "G-1", "G#-1", "A-1", "A#-1", "B-1",
    "C0", "C#0", "D0", "D#0", "E0", "F0", "F#0", "G0", "G#0", "A0", "A#0", "B0",
    "C1", "C#1", "D1", "D#1", "E1", "F1", "F#1", "G1", "G#1", "A1", "A#1", "B1",
    "C2", "C#2", "D2", "D#2", "E2", "F2", "F#2", "G2", "G#2", "A2", "A#2", "B2",
    "C3", "C#3", "D3", "D#3", "E3", "F3", "F#3", "G3", "G#3", "A3", "A#3", "B3",
    "C4", "C#4", "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4", "A4", "A#4", "B4",
    "C5", "C#5", "D5", "D#5", "E5", "F5", "F#5", "G5", "G#5", "A5", "A#5", "B5",
    "C6", "C#6", "D6", "D#6", "E6", "F6", "F#6", "G6", "G#6", "A6", "A#6", "B6",
    "C7", "C#7", "D7", "D#7", "E7", "F7", "F#7", "G7", "G#7", "A7", "A#7", "B7",
    "C8", "C#8", "D8", "D#8", "E8", "F8", "F#8", "G8", "G#8", "A8", "A#8", "B8",
    "C9", "C#9", "D9", "D#9", "E9", "F9", "F#9", "G9",
];

/// Short percussion voice names, indexed by note number minus 128.
pub(crate) const PERCUSSION_NAMES: [&str; 128] = [
    "P000", "P001", "P002", "P003", "P004", "P005", "P006", "P007",
    "P008", "P009", "P010", "P011", "P012", "P013", "P014", "P015",
    "P016", "P017", "P018", "P019", "P020", "P021", "P022", "P023",
    "P024", "P025", "P026", "HiQ", "Slap", "ScrPu", "ScrPl", "Stick",
    "SqClk", "MetCk", "MetBl", "ABasD", "BassD", "SStck", "ASnar", "Clap",
    "ESnar", "LFTom", "HHatC", "HFTom", "HHatP", "LTom", "HHatO", "LMTom",
    "HMTom", "Crsh1", "HTom", "Ride1", "Chin", "RiBel", "Tamb", "Splsh",
    "CowBl", "Crsh2", "VSlap", "Ride2", "HBong", "LBong", "MHCng", "OHCng",
    "LCnga", "HTimb", "LTimb", "HAgog", "LAgog", "Cabas", "Marac", "SWhis",
    "LWhis", "SGuir", "LGuir", "Clave", "HWood", "LWood", "MCuic", "OCuic",
    "MTria", "OTria", "Shakr", "JBell", "BelTr", "Casta", "MSurd", "OSurd",
    "P088", "P089", "P090", "P091", "P092", "P093", "P094", "P095",
    "P096", "P097", "P098", "P099", "P100", "P101", "P102", "P103",
    "P104", "P105", "P106", "P107", "P108", "P109", "P110", "P111",
    "P112", "P113", "P114", "P115", "P116", "P117", "P118", "P119",
    "P120", "P121", "P122", "P123", "P124", "P125", "P126", "P127",
];

/// General MIDI program names.
pub(crate) const INSTRUMENT_NAMES: [&str; 128] = [
    "Acoustic Grand Piano", "Bright Acoustic Piano", "Electric Grand Piano", "Honky-tonk Piano",
    "Electric Piano 1", "Electric Piano 2", "Harpsichord", "Clavinet", "Celesta", "Glockenspiel",
    "Music Box", "Vibraphone", "Marimba", "Xylophone", "Tubular Bells", "Dulcimer",
    "Drawbar Organ", "Percussive Organ", "Rock Organ", "Church Organ", "Reed Organ", "Accordion",
    "Harmonica", "Tango Accordion", "Acoustic Guitar (nylon)", "Acoustic Guitar (steel)",
    "Electric Guitar (jazz)", "Electric Guitar (clean)", "Electric Guitar (muted)",
    "Overdriven Guitar", "Distortion Guitar", "Guitar Harmonics", "Acoustic Bass",
    "Electric Bass (finger)", "Electric Bass (pick)", "Fretless Bass", "Slap Bass 1",
    "Slap Bass 2", "Synth Bass 1", "Synth Bass 2", "Violin", "Viola", "Cello", "Contrabass",
    "Tremolo Strings", "Pizzicato Strings", "Orchestral Harp", "Timpani", "String Ensemble 1",
    "String Ensemble 2", "Synth Strings 1", "Synth Strings 2", "Choir Aahs", "Voice Oohs",
    "Synth Voice", "Orchestra Hit", "Trumpet", "Trombone", "Tuba", "Muted Trumpet", "French Horn",
    "Brass Section", "Synth Brass 1", "Synth Brass 2", "Soprano Sax", "Alto Sax", "Tenor Sax",
    "Baritone Sax", "Oboe", "English Horn", "Bassoon", "Clarinet", "Piccolo", "Flute", "Recorder",
    "Pan Flute", "Blown Bottle", "Shakuhachi", "Whistle", "Ocarina", "Lead 1 (square)",
    "Lead 2 (sawtooth)", "Lead 3 (calliope)", "Lead 4 (chiff)", "Lead 5 (charang)",
    "Lead 6 (voice)", "Lead 7 (fifths)", "Lead 8 (bass + lead)", "Pad 1 (new age)", "Pad 2 (warm)",
    "Pad 3 (polysynth)", "Pad 4 (choir)", "Pad 5 (bowed)", "Pad 6 (metallic)", "Pad 7 (halo)",
    "Pad 8 (sweep)", "FX 1 (rain)", "FX 2 (soundtrack)", "FX 3 (crystal)", "FX 4 (atmosphere)",
    "FX 5 (brightness)", "FX 6 (goblins)", "FX 7 (echoes)", "FX 8 (sci-fi)", "Sitar", "Banjo",
    "Shamisen", "Koto", "Kalimba", "Bagpipe", "Fiddle", "Shanai", "Tinkle Bell", "Agogo",
    "Steel Drums", "Woodblock", "Taiko Drum", "Melodic Tom", "Synth Drum", "Reverse Cymbal",
    "Guitar Fret Noise", "Breath Noise", "Seashore", "Bird Tweet", "Telephone Ring", "Helicopter",
    "Applause", "Gunshot",
];
